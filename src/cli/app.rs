//! Main CLI application

use crate::cli::help::{HelpCommand, HELP_COMMAND};
use crate::config::{
    parse_config_auto, parse_config_file, validate_config, validate_manifest, Config,
};
use crate::discovery::{default_cache_path, discover};
use crate::error::{CmdkitError, ConfigError, Result};
use crate::io::set_colors_enabled;
use crate::logging::{self, Verbosity};
use crate::runner::{
    process_args, OptionSpec, RegistrationPolicy, Runner, ShellCommand, EXIT_EXECUTION_FAULT,
};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name shown in help when the configuration has none
const DEFAULT_APP_NAME: &str = "cmdkit";

/// CLI application
#[derive(Debug)]
pub struct App {
    /// Runner holding every registered command
    runner: Runner,
    /// Parsed configuration
    config: Config,
    /// Config file path, when one was loaded
    config_path: Option<PathBuf>,
}

impl App {
    /// Create a new app from the nearest configuration file.
    ///
    /// Without one the app only knows the `help` command.
    pub fn new() -> Result<Self> {
        match parse_config_auto() {
            Ok((config, config_path)) => Self::from_config(config, Some(&config_path)),
            Err(CmdkitError::Config(ConfigError::NotFound(searched))) => {
                debug!("no config file found (searched: {})", searched);
                Self::from_config(Config::default(), None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create app with a specific config file
    pub fn with_config_file(path: PathBuf) -> Result<Self> {
        let config = parse_config_file(&path)?;
        Self::from_config(config, Some(&path))
    }

    /// Build the runner for a parsed configuration.
    ///
    /// Relative paths in the configuration resolve against the directory of
    /// `config_path`, or the working directory without one.
    pub fn from_config(config: Config, config_path: Option<&Path>) -> Result<Self> {
        validate_config(&config)?;

        let base_dir = match config_path.and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => env::current_dir()?,
        };

        let policy = if config.strict {
            RegistrationPolicy::Strict
        } else {
            RegistrationPolicy::Replace
        };
        let mut runner = Runner::with_policy(policy);
        for option in global_options() {
            runner.add_global_option(option)?;
        }

        runner.register(HelpCommand::new(
            config.name.as_deref().unwrap_or(DEFAULT_APP_NAME),
            config.usage.as_deref().unwrap_or_default(),
        ))?;

        let interpreter = config.interpreter.clone().unwrap_or_default();
        for manifest in config.commands.values() {
            let command = ShellCommand::from_manifest(manifest, &interpreter, &base_dir)?;
            runner.register(command)?;
        }

        if let Some(discovery) = &config.discovery {
            let dir = base_dir.join(&discovery.dir);
            let cache_path = match &discovery.cache {
                Some(cache) => Some(base_dir.join(cache)),
                None => default_cache_path(&dir),
            };
            let manifests = discover(&dir, cache_path.as_deref(), &discovery.ignore)?;
            for manifest in &manifests {
                validate_manifest(manifest)?;
                let command = ShellCommand::from_manifest(manifest, &interpreter, &base_dir)?;
                runner.register(command)?;
            }
        }

        let default_command = config.default_command.as_deref().unwrap_or(HELP_COMMAND);
        if runner.resolve(default_command).is_none() {
            return Err(ConfigError::CommandNotFound(default_command.to_string()).into());
        }
        runner.set_default_command(default_command);

        Ok(App {
            runner,
            config,
            config_path: config_path.map(Path::to_path_buf),
        })
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Run the application with command line arguments
    pub fn run(&mut self, args: Vec<String>) -> i32 {
        let code = self.runner.start(Some(args));
        if let Err(e) = self.runner.output().borrow_mut().flush() {
            debug!("could not flush output: {}", e);
        }
        code
    }
}

/// Options every command accepts
fn global_options() -> Vec<OptionSpec> {
    vec![
        OptionSpec::flag("verbose").description("Print verbose output"),
        OptionSpec::flag("quiet").description("Only print command output and errors"),
        OptionSpec::flag("silent").description("Print no output"),
        OptionSpec::flag("no-color").description("Disable colored output"),
    ]
}

/// Run the CLI application and return the process exit code
pub fn run() -> i32 {
    let mut args = process_args();
    let file_path = take_file_arg(&mut args);

    // A missing .env file is fine
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: could not load .env: {}", e);
        }
    }

    if args.iter().any(|arg| arg == "--no-color") {
        set_colors_enabled(false);
    }
    logging::init(Verbosity::from_args(&args));

    let app = match file_path {
        Some(path) => App::with_config_file(path),
        None => App::new(),
    };

    match app {
        Ok(mut app) => app.run(args),
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_EXECUTION_FAULT
        }
    }
}

/// Remove a leading `-f FILE`, `--file FILE` or `--file=FILE` from `args`
fn take_file_arg(args: &mut Vec<String>) -> Option<PathBuf> {
    let first = args.first()?;
    if let Some(path) = first.strip_prefix("--file=") {
        let path = PathBuf::from(path);
        args.remove(0);
        return Some(path);
    }
    if (first == "--file" || first == "-f") && args.len() > 1 {
        let path = PathBuf::from(&args[1]);
        args.drain(..2);
        return Some(path);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::error::DispatchError;
    use crate::io::MemoryOutput;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn app_in(dir: &Path, yaml: &str) -> Result<App> {
        let config_path = dir.join("cmdkit.yml");
        fs::write(&config_path, yaml).unwrap();
        App::with_config_file(config_path)
    }

    fn capture(app: &mut App) -> Rc<RefCell<MemoryOutput>> {
        let out = Rc::new(RefCell::new(MemoryOutput::new()));
        app.runner_mut().set_output(out.clone());
        out
    }

    #[test]
    fn test_take_file_arg() {
        let mut argv = args(&["--file", "test.yml", "build"]);
        assert_eq!(take_file_arg(&mut argv), Some(PathBuf::from("test.yml")));
        assert_eq!(argv, args(&["build"]));
    }

    #[test]
    fn test_take_file_arg_short_and_inline() {
        let mut argv = args(&["-f", "test.yml"]);
        assert_eq!(take_file_arg(&mut argv), Some(PathBuf::from("test.yml")));
        assert!(argv.is_empty());

        let mut argv = args(&["--file=other.yml", "help"]);
        assert_eq!(take_file_arg(&mut argv), Some(PathBuf::from("other.yml")));
        assert_eq!(argv, args(&["help"]));
    }

    #[test]
    fn test_take_file_arg_only_leading() {
        let mut argv = args(&["build", "-f", "x.yml"]);
        assert_eq!(take_file_arg(&mut argv), None);
        assert_eq!(argv.len(), 3);
    }

    #[test]
    fn test_app_registers_help_and_inline_commands() {
        let dir = TempDir::new().unwrap();
        let app = app_in(
            dir.path(),
            "commands:\n  build:\n    aliases: [b]\n    run: echo build\n",
        )
        .unwrap();

        let runner = app.runner();
        assert!(runner.get_command("help").is_some());
        assert_eq!(runner.resolve("b"), Some("build"));
        assert_eq!(runner.default_command(), Some("help"));
        assert_eq!(runner.global_options().len(), 4);
        assert_eq!(app.config_path(), Some(dir.path().join("cmdkit.yml").as_path()));
    }

    #[test]
    fn test_app_runs_in_config_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("marker.txt"), "").unwrap();
        let mut app = app_in(
            dir.path(),
            "commands:\n  look:\n    run:\n      exec: ls marker.txt\n      quiet: true\n",
        )
        .unwrap();
        let out = capture(&mut app);

        assert_eq!(app.run(args(&["look"])), 0);
        assert_eq!(out.borrow().contents(), "marker.txt\n");
    }

    #[test]
    fn test_app_discovers_manifests() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("commands")).unwrap();
        fs::write(
            dir.path().join("commands").join("lint.yml"),
            "description: Run lints\nrun:\n  exec: echo linting\n  quiet: true\n",
        )
        .unwrap();
        let mut app = app_in(
            dir.path(),
            "discovery:\n  dir: commands\n  cache: .cache/commands.json\n",
        )
        .unwrap();
        let out = capture(&mut app);

        assert_eq!(app.run(args(&["lint"])), 0);
        assert_eq!(out.borrow().contents(), "linting\n");
        assert!(dir.path().join(".cache/commands.json").is_file());
    }

    #[test]
    fn test_strict_discovery_collision() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("commands")).unwrap();
        fs::write(dir.path().join("commands").join("build.yml"), "run: echo two\n").unwrap();
        let yaml = "discovery:\n  dir: commands\n  cache: cache.json\ncommands:\n  build:\n    run: echo one\n";

        let result = app_in(dir.path(), yaml);
        assert!(matches!(
            result,
            Err(CmdkitError::Dispatch(DispatchError::NameCollision(_)))
        ));
    }

    #[test]
    fn test_relaxed_discovery_replaces_inline() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("commands")).unwrap();
        fs::write(
            dir.path().join("commands").join("build.yml"),
            "run:\n  exec: echo two\n  quiet: true\n",
        )
        .unwrap();
        let yaml = "strict: false\ndiscovery:\n  dir: commands\n  cache: cache.json\ncommands:\n  build:\n    run: echo one\n";
        let mut app = app_in(dir.path(), yaml).unwrap();
        let out = capture(&mut app);

        assert_eq!(app.run(args(&["build"])), 0);
        assert_eq!(out.borrow().contents(), "two\n");
    }

    #[test]
    fn test_unknown_default_command() {
        let config = parse_config("default-command: deploy\n").unwrap();
        let result = App::from_config(config, None);
        assert!(matches!(
            result,
            Err(CmdkitError::Config(ConfigError::CommandNotFound(_)))
        ));
    }

    #[test]
    fn test_configured_default_command() {
        let config = parse_config(
            "default-command: hello\ncommands:\n  hello:\n    options:\n      - name: --name\n        default: you\n    run:\n      exec: echo hi ${name}\n      quiet: true\n",
        )
        .unwrap();
        let mut app = App::from_config(config, None).unwrap();
        let out = capture(&mut app);

        assert_eq!(app.run(args(&["--name=Ali"])), 0);
        assert_eq!(out.borrow().contents(), "hi Ali\n");
    }
}
