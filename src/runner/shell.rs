//! Declarative commands
//!
//! A [`ShellCommand`] is built from a YAML manifest. Its steps are shell
//! command lines run through the interpreter, or delegations to other
//! registered commands.

use crate::config::{CommandManifest, ExecStep, OptionKindConfig, OptionManifest, Step, TaskStep};
use crate::error::{ConfigError, ConfigResult};
use crate::io::Style;
use crate::logging::Verbosity;
use crate::runner::command::{Command, CommandSpec};
use crate::runner::dispatch::{EXIT_EXECUTION_FAULT, EXIT_SUCCESS};
use crate::runner::interpolate::{interpolate, interpolate_list};
use crate::runner::invocation::Invocation;
use crate::runner::option::{OptionKind, OptionSpec};
use crate::runner::validator::InputValidator;
use anyhow::Context as _;
use colored::Color;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use tracing::debug;

/// Interpreter used when the configuration names none
pub const DEFAULT_INTERPRETER: &[&str] = &["sh", "-c"];

/// A command defined by a manifest
#[derive(Debug, Clone)]
pub struct ShellCommand {
    spec: CommandSpec,
    steps: Vec<Step>,
    interpreter: Vec<String>,
    working_dir: PathBuf,
}

impl ShellCommand {
    /// Build a command from its manifest.
    ///
    /// Shell steps run in `working_dir` through `interpreter`.
    pub fn from_manifest(
        manifest: &CommandManifest,
        interpreter: &[String],
        working_dir: &Path,
    ) -> ConfigResult<Self> {
        let mut spec = CommandSpec::new(&manifest.name)
            .description(manifest.description.as_deref().unwrap_or_default())
            .aliases(&manifest.aliases)
            .hidden(manifest.hidden);
        if let Some(group) = &manifest.group {
            spec = spec.group(group.clone());
        }
        for option in &manifest.options {
            spec = spec.option(option_spec(option)?);
        }
        spec.validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let interpreter = if interpreter.is_empty() {
            DEFAULT_INTERPRETER.iter().map(|s| s.to_string()).collect()
        } else {
            interpreter.to_vec()
        };

        Ok(ShellCommand {
            spec,
            steps: manifest.run.clone(),
            interpreter,
            working_dir: working_dir.to_path_buf(),
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn interpreter(&self) -> &[String] {
        &self.interpreter
    }

    fn run_shell(
        &self,
        ctx: &Invocation<'_>,
        step: &ExecStep,
        vars: &HashMap<String, String>,
    ) -> anyhow::Result<i32> {
        let verbosity = Verbosity::of(ctx);
        let exec_str = interpolate(&step.exec, vars);

        // Print the command if not quiet
        if !step.quiet && verbosity >= Verbosity::Normal {
            let print_str = interpolate(step.print.as_deref().unwrap_or(&step.exec), vars);
            ctx.write(
                format_args!("$ {}\n", print_str),
                Style::color(Color::Cyan),
            )?;
        }

        let working_dir = match &step.dir {
            Some(dir) => self.working_dir.join(interpolate(dir, vars)),
            None => self.working_dir.clone(),
        };

        let mut command = StdCommand::new(&self.interpreter[0]);
        command
            .args(&self.interpreter[1..])
            .arg(&exec_str)
            .current_dir(&working_dir)
            .stdin(Stdio::inherit())
            .envs(vars);

        debug!("running {:?} in {}", exec_str, working_dir.display());
        let output = command
            .output()
            .with_context(|| format!("failed to run '{}'", exec_str))?;

        if verbosity > Verbosity::Silent {
            ctx.print(format_args!("{}", String::from_utf8_lossy(&output.stdout)))?;
            ctx.print(format_args!("{}", String::from_utf8_lossy(&output.stderr)))?;
        }

        Ok(output.status.code().unwrap_or(EXIT_EXECUTION_FAULT))
    }

    fn run_task(
        &self,
        ctx: &mut Invocation<'_>,
        step: &TaskStep,
        vars: &HashMap<String, String>,
    ) -> i32 {
        let mut args = interpolate_list(&step.args, vars);

        // Global flags carry over to the delegate
        let forwarded: Vec<String> = ctx
            .runner()
            .global_options()
            .iter()
            .filter(|option| option.kind() == OptionKind::Flag && ctx.is_set(option.name()))
            .map(OptionSpec::display_name)
            .filter(|flag| !args.contains(flag))
            .collect();
        args.extend(forwarded);

        ctx.exec_sub_command(&step.task, args)
    }
}

impl Command for ShellCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn exec(&self, ctx: &mut Invocation<'_>) -> anyhow::Result<i32> {
        let vars = variables(ctx);

        for step in &self.steps {
            let code = match step {
                Step::Shell(line) => {
                    let step = ExecStep {
                        exec: line.clone(),
                        print: None,
                        quiet: false,
                        dir: None,
                    };
                    self.run_shell(ctx, &step, &vars)?
                }
                Step::Exec(step) => self.run_shell(ctx, step, &vars)?,
                Step::Task(step) => self.run_task(ctx, step, &vars),
            };

            if code != EXIT_SUCCESS {
                debug!("'{}' stopped at a step returning {}", self.spec.name(), code);
                return Ok(code);
            }
        }

        Ok(EXIT_SUCCESS)
    }
}

/// Values visible to `${name}` in the steps. Flags read `true` or `false`,
/// unset options read empty.
fn variables(ctx: &Invocation<'_>) -> HashMap<String, String> {
    ctx.arguments()
        .iter()
        .map(|argument| {
            let value = match argument.kind() {
                OptionKind::Flag => argument.is_set().to_string(),
                _ => argument.value().unwrap_or_default().to_string(),
            };
            (argument.name().to_string(), value)
        })
        .collect()
}

fn option_spec(manifest: &OptionManifest) -> ConfigResult<OptionSpec> {
    let mut spec = match manifest.kind {
        None => OptionSpec::new(&manifest.name),
        Some(OptionKindConfig::Positional) => OptionSpec::positional(&manifest.name),
        Some(OptionKindConfig::Named) => OptionSpec::named(&manifest.name),
        Some(OptionKindConfig::Flag) => OptionSpec::flag(&manifest.name),
    };

    spec = spec
        .description(manifest.description.as_deref().unwrap_or_default())
        .allowed(manifest.values.iter().cloned());
    if manifest.optional {
        spec = spec.optional(true);
    }
    if let Some(default) = &manifest.default {
        spec = spec.default_value(default.clone());
    }

    if let Some(name) = &manifest.validator {
        let mut validator = InputValidator::by_name(name)
            .ok_or_else(|| ConfigError::Invalid(format!("Invalid validator: {}", name)))?;
        if let Some(prompt) = &manifest.error_prompt {
            validator = validator.with_error_prompt(prompt.clone());
        }
        spec = spec.validator(validator);
    }

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryOutput;
    use crate::runner::dispatch::{Runner, EXIT_BIND_FAILED};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn manifest(yaml: &str) -> CommandManifest {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn runner_with(
        manifests: &[CommandManifest],
        dir: &Path,
    ) -> (Runner, Rc<RefCell<MemoryOutput>>) {
        let out = Rc::new(RefCell::new(MemoryOutput::new()));
        let mut runner = Runner::new();
        runner.set_output(out.clone());
        for m in manifests {
            runner
                .register(ShellCommand::from_manifest(m, &[], dir).unwrap())
                .unwrap();
        }
        (runner, out)
    }

    fn argv(raw: &[&str]) -> Option<Vec<String>> {
        Some(raw.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_option_mapping() {
        let m = manifest(
            r#"
name: deploy
aliases: [ship]
options:
  - name: target
    values: [staging, prod]
  - name: --retries
    validator: integer
    error-prompt: Retries must be a whole number
    default: "3"
  - name: dry-run
    kind: flag
"#,
        );
        let command = ShellCommand::from_manifest(&m, &[], Path::new(".")).unwrap();
        let spec = command.spec();

        assert_eq!(spec.get_aliases(), ["ship"]);
        assert_eq!(spec.get_options()[0].kind(), OptionKind::Positional);
        assert_eq!(spec.get_options()[1].kind(), OptionKind::Named);
        assert_eq!(spec.get_options()[1].get_default(), Some("3"));
        assert_eq!(
            spec.get_options()[1].get_validator().unwrap().error_prompt(),
            "Retries must be a whole number"
        );
        assert_eq!(spec.get_options()[2].kind(), OptionKind::Flag);
        assert_eq!(command.interpreter(), ["sh", "-c"]);
    }

    #[test]
    fn test_unknown_validator_is_rejected() {
        let m = manifest("name: wait\noptions:\n  - name: n\n    validator: duration\n");
        assert!(ShellCommand::from_manifest(&m, &[], Path::new(".")).is_err());
    }

    #[test]
    fn test_runs_steps_with_variables() {
        let dir = TempDir::new().unwrap();
        let m = manifest(
            r#"
name: greet
options:
  - name: --name
    default: World
  - name: loud
    kind: flag
run:
  - echo "Hello ${name} ${loud}"
  - exec: echo hidden
    quiet: true
"#,
        );
        let (mut runner, out) = runner_with(&[m], dir.path());

        assert_eq!(runner.start(argv(&["greet", "--name=Bob"])), 0);
        let contents = out.borrow().contents().to_string();
        assert!(contents.contains("$ echo \"Hello Bob false\"\n"));
        assert!(contents.contains("Hello Bob false\n"));
        assert!(contents.contains("hidden\n"));
        assert!(!contents.contains("$ echo hidden"));
    }

    #[test]
    fn test_stops_at_first_failing_step() {
        let dir = TempDir::new().unwrap();
        let m = manifest("name: fail\nrun:\n  - exit 7\n  - echo unreachable\n");
        let (mut runner, out) = runner_with(&[m], dir.path());

        assert_eq!(runner.start(argv(&["fail"])), 7);
        assert!(!out.borrow().contents().contains("unreachable\n"));
    }

    #[test]
    fn test_step_directory_is_relative_to_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("marker.txt"), "").unwrap();
        let m = manifest("name: look\nrun:\n  exec: ls\n  dir: sub\n  quiet: true\n");
        let (mut runner, out) = runner_with(&[m], dir.path());

        assert_eq!(runner.start(argv(&["look"])), 0);
        assert_eq!(out.borrow().contents(), "marker.txt\n");
    }

    #[test]
    fn test_task_step_delegates_and_restores_vector() {
        let dir = TempDir::new().unwrap();
        let build = manifest(
            "name: build\naliases: [b]\noptions:\n  - name: --mode\n    values: [debug, release]\nrun:\n  exec: echo building ${mode}\n  quiet: true\n",
        );
        let release = manifest(
            "name: release\nrun:\n  - task: b\n    args: [\"--mode=release\"]\n  - exec: echo done\n    quiet: true\n",
        );
        let (mut runner, out) = runner_with(&[build, release], dir.path());

        assert_eq!(runner.start(argv(&["release"])), 0);
        assert_eq!(out.borrow().contents(), "building release\ndone\n");
        assert_eq!(runner.args_vector(), Some(&["release".to_string()][..]));
    }

    #[test]
    fn test_task_step_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let build = manifest(
            "name: build\noptions:\n  - name: --mode\n    values: [debug, release]\n",
        );
        let release = manifest(
            "name: release\nrun:\n  - task: build\n    args: [\"--mode=fast\"]\n  - echo unreachable\n",
        );
        let (mut runner, out) = runner_with(&[build, release], dir.path());

        assert_eq!(runner.start(argv(&["release"])), EXIT_BIND_FAILED);
        let contents = out.borrow().contents().to_string();
        assert!(contents.contains("fast"));
        assert!(!contents.contains("unreachable\n"));
    }

    #[test]
    fn test_quiet_global_suppresses_echo() {
        let dir = TempDir::new().unwrap();
        let m = manifest("name: hi\nrun: echo hi\n");
        let (mut runner, out) = runner_with(&[m], dir.path());
        runner.add_global_option(OptionSpec::flag("quiet")).unwrap();

        assert_eq!(runner.start(argv(&["hi", "--quiet"])), 0);
        assert_eq!(out.borrow().contents(), "hi\n");
    }
}
