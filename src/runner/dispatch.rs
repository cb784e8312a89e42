//! Command registry and dispatch
//!
//! The [`Runner`] owns the registered commands and turns an argument vector
//! into an exit code: pick the command, bind its options, run its body.
//! Nothing raised by a command escapes [`Runner::start`].

use crate::error::DispatchError;
use crate::io::{shared_input, shared_output, ConsoleInput, ConsoleOutput};
use crate::io::{SharedInput, SharedOutput};
use crate::runner::binding::{self, is_flag_token, Binding};
use crate::runner::command::{Command, CommandSpec};
use crate::runner::invocation::{write_labeled, Invocation};
use crate::runner::option::{is_valid_name, OptionSpec};
use colored::Color;
use indexmap::IndexMap;
use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Once;
use std::thread;
use tracing::{debug, warn};

/// The command ran and reported success
pub const EXIT_SUCCESS: i32 = 0;
/// The command body returned an error or panicked
pub const EXIT_EXECUTION_FAULT: i32 = 1;
/// The argument vector named no command and there is no default
pub const EXIT_NO_COMMAND: i32 = 2;
/// The requested command is not registered
pub const EXIT_UNKNOWN_COMMAND: i32 = 3;
/// The tokens could not be bound to the command's options
pub const EXIT_BIND_FAILED: i32 = 4;

/// How deep sub-commands may delegate to one another
pub const MAX_NESTING: usize = 64;

/// What happens when a registration reuses a name or alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Reject the registration
    #[default]
    Strict,
    /// The newer registration wins
    Replace,
}

#[derive(Default)]
struct StreamOverride {
    output: Option<SharedOutput>,
    input: Option<SharedInput>,
}

/// Command registry and dispatch engine
pub struct Runner {
    commands: IndexMap<String, Rc<dyn Command>>,
    aliases: HashMap<String, String>,
    global_options: Vec<OptionSpec>,
    args_vector: Option<Vec<String>>,
    default_command: Option<String>,
    policy: RegistrationPolicy,
    output: SharedOutput,
    input: SharedInput,
    overrides: HashMap<String, StreamOverride>,
    depth: usize,
}

impl Runner {
    /// Strict runner on the process console
    pub fn new() -> Self {
        Self::with_policy(RegistrationPolicy::Strict)
    }

    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Runner {
            commands: IndexMap::new(),
            aliases: HashMap::new(),
            global_options: Vec::new(),
            args_vector: None,
            default_command: None,
            policy,
            output: shared_output(ConsoleOutput::stdout()),
            input: shared_input(ConsoleInput::new()),
            overrides: HashMap::new(),
            depth: 0,
        }
    }

    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RegistrationPolicy) {
        self.policy = policy;
    }

    /// Register a command
    pub fn register<C: Command + 'static>(&mut self, command: C) -> Result<(), DispatchError> {
        self.register_rc(Rc::new(command))
    }

    /// Register an already shared command
    pub fn register_rc(&mut self, command: Rc<dyn Command>) -> Result<(), DispatchError> {
        let spec = command.spec();
        spec.validate()?;

        let name = spec.name().to_string();
        let aliases = spec.get_aliases().to_vec();

        match self.policy {
            RegistrationPolicy::Strict => {
                for candidate in std::iter::once(&name).chain(aliases.iter()) {
                    if self.is_taken(candidate) {
                        return Err(DispatchError::NameCollision(candidate.clone()));
                    }
                }
            }
            RegistrationPolicy::Replace => {
                if self.commands.contains_key(&name) {
                    debug!("replacing command '{}'", name);
                    self.aliases.retain(|_, target| target != &name);
                }
                // the name must resolve to this command, not to an older alias
                self.aliases.remove(&name);
            }
        }

        for alias in aliases {
            if let Some(previous) = self.aliases.insert(alias.clone(), name.clone()) {
                debug!("alias '{}' moved from '{}' to '{}'", alias, previous, name);
            }
        }
        debug!("registered command '{}'", name);
        self.commands.insert(name, command);
        Ok(())
    }

    /// Remove a command and its aliases
    pub fn unregister(&mut self, name: &str) -> Option<Rc<dyn Command>> {
        let command = self.commands.shift_remove(name)?;
        self.aliases.retain(|_, target| target != name);
        self.overrides.remove(name);
        Some(command)
    }

    fn is_taken(&self, name: &str) -> bool {
        self.commands.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Registered commands by canonical name, in registration order
    pub fn get_commands(&self) -> &IndexMap<String, Rc<dyn Command>> {
        &self.commands
    }

    /// Command registered under the canonical `name`
    pub fn get_command(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Canonical name for a name or alias
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some(target) = self.aliases.get(name) {
            return Some(target.as_str());
        }
        self.commands.get_key_value(name).map(|(k, _)| k.as_str())
    }

    /// Alias table, alias to canonical name
    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    /// Command used when the vector names none
    pub fn set_default_command(&mut self, name: impl Into<String>) {
        self.default_command = Some(name.into());
    }

    pub fn default_command(&self) -> Option<&str> {
        self.default_command.as_deref()
    }

    /// Add an option bound for every command
    pub fn add_global_option(&mut self, option: OptionSpec) -> Result<(), DispatchError> {
        if !is_valid_name(option.name()) {
            return Err(DispatchError::InvalidName(option.name().to_string()));
        }
        if self.global_options.iter().any(|o| o.name() == option.name()) {
            return Err(DispatchError::DuplicateOption {
                command: "<global>".to_string(),
                option: option.name().to_string(),
            });
        }
        self.global_options.push(option);
        Ok(())
    }

    pub fn global_options(&self) -> &[OptionSpec] {
        &self.global_options
    }

    /// Replace the argument vector used by [`Runner::start`]
    pub fn set_args_vector<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args_vector = Some(args.into_iter().map(Into::into).collect());
    }

    pub fn args_vector(&self) -> Option<&[String]> {
        self.args_vector.as_deref()
    }

    /// Default output stream for every command
    pub fn set_output(&mut self, output: SharedOutput) {
        self.output = output;
    }

    /// Default input stream for every command
    pub fn set_input(&mut self, input: SharedInput) {
        self.input = input;
    }

    pub fn output(&self) -> SharedOutput {
        self.output.clone()
    }

    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }

    /// Output stream for one command only
    pub fn set_command_output(&mut self, name: &str, output: SharedOutput) {
        self.overrides.entry(name.to_string()).or_default().output = Some(output);
    }

    /// Input stream for one command only
    pub fn set_command_input(&mut self, name: &str, input: SharedInput) {
        self.overrides.entry(name.to_string()).or_default().input = Some(input);
    }

    fn output_for(&self, name: &str) -> SharedOutput {
        self.overrides
            .get(name)
            .and_then(|o| o.output.clone())
            .unwrap_or_else(|| self.output.clone())
    }

    fn input_for(&self, name: &str) -> SharedInput {
        self.overrides
            .get(name)
            .and_then(|o| o.input.clone())
            .unwrap_or_else(|| self.input.clone())
    }

    /// Command options followed by the global options they do not shadow
    pub fn effective_options(&self, spec: &CommandSpec) -> Vec<OptionSpec> {
        let mut options = spec.get_options().to_vec();
        for global in &self.global_options {
            if spec.get_option(global.name()).is_none() {
                options.push(global.clone());
            }
        }
        options
    }

    /// Bind tokens for a command without running it
    pub fn bind(&self, name: &str, tokens: &[String]) -> Result<Binding, DispatchError> {
        let canonical = self
            .resolve(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;
        let command = &self.commands[canonical];
        Ok(binding::bind(&self.effective_options(command.spec()), tokens))
    }

    /// Run the application and return the exit code.
    ///
    /// `argv` replaces the stored vector when given. Without either, the
    /// process arguments (minus the program name) are used.
    pub fn start(&mut self, argv: Option<Vec<String>>) -> i32 {
        if let Some(argv) = argv {
            self.args_vector = Some(argv);
        }
        let argv = self
            .args_vector
            .get_or_insert_with(process_args)
            .clone();

        match guarded(|| self.dispatch(argv)) {
            Ok(code) => code,
            Err(payload) => {
                report(&self.output, &panic_message(payload.as_ref()));
                EXIT_EXECUTION_FAULT
            }
        }
    }

    /// Run `name` with `args` as a nested dispatch, restoring the argument
    /// vector afterwards
    pub fn exec_sub_command(&mut self, name: &str, args: Vec<String>) -> i32 {
        if self.depth >= MAX_NESTING {
            let error = DispatchError::NestingTooDeep {
                name: name.to_string(),
                limit: MAX_NESTING,
            };
            report(&self.output, &error);
            return EXIT_EXECUTION_FAULT;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(name.to_string());
        argv.extend(args);

        debug!("delegating to sub-command: {:?}", argv);
        let saved = self.args_vector.replace(argv.clone());
        self.depth += 1;
        let code = match guarded(|| self.dispatch(argv)) {
            Ok(code) => code,
            Err(payload) => {
                report(&self.output, &panic_message(payload.as_ref()));
                EXIT_EXECUTION_FAULT
            }
        };
        self.depth -= 1;
        self.args_vector = saved;
        code
    }

    fn dispatch(&mut self, argv: Vec<String>) -> i32 {
        let (requested, tokens) = match argv.split_first() {
            Some((first, rest)) if !is_flag_token(first) => (first.clone(), rest.to_vec()),
            _ => match &self.default_command {
                Some(default) => (default.clone(), argv.clone()),
                None => {
                    report(&self.output, &DispatchError::NoCommand);
                    return EXIT_NO_COMMAND;
                }
            },
        };

        let Some(command) = self
            .resolve(&requested)
            .and_then(|canonical| self.commands.get(canonical))
            .cloned()
        else {
            report(&self.output, &DispatchError::UnknownCommand(requested));
            return EXIT_UNKNOWN_COMMAND;
        };

        self.run_command(command, &tokens)
    }

    fn run_command(&mut self, command: Rc<dyn Command>, tokens: &[String]) -> i32 {
        let name = command.name().to_string();
        let output = self.output_for(&name);
        let input = self.input_for(&name);

        let binding = binding::bind(&self.effective_options(command.spec()), tokens);
        if !binding.is_ok() {
            debug!("binding failed for '{}': {:?}", name, binding.errors);
            for error in &binding.errors {
                report(&output, error);
            }
            return EXIT_BIND_FAILED;
        }

        debug!("executing '{}'", name);
        let outcome = {
            let mut invocation =
                Invocation::new(self, name.clone(), binding.arguments, output.clone(), input);
            guarded(|| command.exec(&mut invocation))
        };

        match outcome {
            Ok(Ok(code)) => {
                debug!("'{}' finished with code {}", name, code);
                code
            }
            Ok(Err(e)) => {
                report(&output, &format!("{}: {:#}", name, e));
                EXIT_EXECUTION_FAULT
            }
            Err(payload) => {
                report(
                    &output,
                    &format!("{} panicked: {}", name, panic_message(payload.as_ref())),
                );
                EXIT_EXECUTION_FAULT
            }
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .field("global_options", &self.global_options)
            .field("args_vector", &self.args_vector)
            .field("default_command", &self.default_command)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

thread_local! {
    /// Guarded calls currently on this thread's stack
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static INSTALL_HOOK: Once = Once::new();

/// Run `f`, turning a panic into an `Err` carrying its payload.
///
/// Panics caught here are reported through the output stream by the caller,
/// so the process panic hook only logs them. Panics elsewhere still reach the
/// previously installed hook.
fn guarded<R>(f: impl FnOnce() -> R) -> thread::Result<R> {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.with(Cell::get) > 0 {
                debug!("contained panic: {}", info);
            } else {
                previous(info);
            }
        }));
    });

    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));
    result
}

/// Process arguments minus the program name.
///
/// Arguments that are not valid UTF-8 are converted lossily.
pub fn process_args() -> Vec<String> {
    env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Write an error line to `output`, falling back to the log
fn report(output: &SharedOutput, message: &dyn fmt::Display) {
    let result = match output.try_borrow_mut() {
        Ok(mut out) => write_labeled(&mut *out, "Error", Color::Red, format_args!("{}", message)),
        Err(_) => {
            warn!("output stream busy, dropping error: {}", message);
            return;
        }
    };
    if let Err(e) = result {
        warn!("could not report error '{}': {}", message, e);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown failure".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryOutput;
    use crate::runner::command::ClosureCommand;
    use std::cell::RefCell;

    fn quiet_runner(policy: RegistrationPolicy) -> (Runner, Rc<RefCell<MemoryOutput>>) {
        let out = Rc::new(RefCell::new(MemoryOutput::new()));
        let mut runner = Runner::with_policy(policy);
        runner.set_output(out.clone());
        (runner, out)
    }

    fn noop(name: &str) -> ClosureCommand {
        ClosureCommand::new(CommandSpec::new(name), |_| Ok(EXIT_SUCCESS))
    }

    fn argv(raw: &[&str]) -> Option<Vec<String>> {
        Some(raw.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_strict_rejects_name_and_alias_collisions() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Strict);
        runner
            .register(ClosureCommand::new(
                CommandSpec::new("build").alias("b"),
                |_| Ok(0),
            ))
            .unwrap();

        assert_eq!(
            runner.register(noop("build")),
            Err(DispatchError::NameCollision("build".to_string()))
        );
        assert_eq!(
            runner.register(noop("b")),
            Err(DispatchError::NameCollision("b".to_string()))
        );
        assert_eq!(
            runner.register(ClosureCommand::new(
                CommandSpec::new("bundle").alias("b"),
                |_| Ok(0)
            )),
            Err(DispatchError::NameCollision("b".to_string()))
        );
        assert_eq!(runner.get_commands().len(), 1);
    }

    #[test]
    fn test_replace_newer_wins() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Replace);
        runner
            .register(ClosureCommand::new(
                CommandSpec::new("build").alias("b").description("old"),
                |_| Ok(1),
            ))
            .unwrap();
        runner
            .register(ClosureCommand::new(
                CommandSpec::new("build").description("new"),
                |_| Ok(2),
            ))
            .unwrap();

        assert_eq!(runner.get_commands().len(), 1);
        assert_eq!(
            runner.get_command("build").unwrap().spec().get_description(),
            "new"
        );
        // the replaced command's alias is gone
        assert_eq!(runner.resolve("b"), None);
        assert_eq!(runner.start(argv(&["build"])), 2);
    }

    #[test]
    fn test_replace_name_over_alias() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Replace);
        runner
            .register(ClosureCommand::new(
                CommandSpec::new("status").alias("st"),
                |_| Ok(1),
            ))
            .unwrap();
        runner
            .register(ClosureCommand::new(CommandSpec::new("st"), |_| Ok(2)))
            .unwrap();

        assert_eq!(runner.resolve("st"), Some("st"));
        assert_eq!(runner.start(argv(&["st"])), 2);
        assert_eq!(runner.start(argv(&["status"])), 1);
    }

    #[test]
    fn test_register_rejects_invalid_spec() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Strict);
        assert!(matches!(
            runner.register(noop("")),
            Err(DispatchError::InvalidName(_))
        ));
    }

    #[test]
    fn test_unregister_drops_aliases() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Strict);
        runner
            .register(ClosureCommand::new(
                CommandSpec::new("list").alias("ls"),
                |_| Ok(0),
            ))
            .unwrap();

        assert!(runner.unregister("list").is_some());
        assert!(runner.aliases().is_empty());
        assert!(runner.unregister("list").is_none());
    }

    #[test]
    fn test_no_command() {
        let (mut runner, out) = quiet_runner(RegistrationPolicy::Strict);
        runner.register(noop("build")).unwrap();

        assert_eq!(runner.start(argv(&[])), EXIT_NO_COMMAND);
        assert!(out.borrow().contents().contains("No command was supplied."));
    }

    #[test]
    fn test_unknown_command() {
        let (mut runner, out) = quiet_runner(RegistrationPolicy::Strict);
        assert_eq!(runner.start(argv(&["deploy"])), EXIT_UNKNOWN_COMMAND);
        assert!(out
            .borrow()
            .contents()
            .contains("Command 'deploy' is not supported."));
    }

    #[test]
    fn test_default_command_receives_flags() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Strict);
        runner
            .register(ClosureCommand::new(
                CommandSpec::new("help").option(OptionSpec::flag("all")),
                |ctx| Ok(if ctx.is_set("all") { 10 } else { 11 }),
            ))
            .unwrap();
        runner.set_default_command("help");

        assert_eq!(runner.start(argv(&[])), 11);
        assert_eq!(runner.start(argv(&["--all"])), 10);
    }

    #[test]
    fn test_global_options_are_bound() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Strict);
        runner.add_global_option(OptionSpec::flag("verbose")).unwrap();
        assert!(runner.add_global_option(OptionSpec::flag("verbose")).is_err());
        runner
            .register(ClosureCommand::new(CommandSpec::new("run"), |ctx| {
                Ok(if ctx.is_set("--verbose") { 1 } else { 0 })
            }))
            .unwrap();

        assert_eq!(runner.start(argv(&["run", "--verbose"])), 1);
        assert_eq!(runner.start(argv(&["run"])), 0);
    }

    #[test]
    fn test_command_option_shadows_global() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Strict);
        runner
            .add_global_option(OptionSpec::named("level").default_value("1"))
            .unwrap();
        let spec = CommandSpec::new("run").option(OptionSpec::named("level").default_value("2"));

        let options = runner.effective_options(&spec);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].get_default(), Some("2"));
    }

    #[test]
    fn test_error_result_is_execution_fault() {
        let (mut runner, out) = quiet_runner(RegistrationPolicy::Strict);
        runner
            .register(ClosureCommand::new(CommandSpec::new("fail"), |_| {
                anyhow::bail!("disk full")
            }))
            .unwrap();

        assert_eq!(runner.start(argv(&["fail"])), EXIT_EXECUTION_FAULT);
        assert!(out.borrow().contents().contains("fail: disk full"));
    }

    #[test]
    fn test_bind_inspection() {
        let (mut runner, _) = quiet_runner(RegistrationPolicy::Strict);
        runner
            .register(ClosureCommand::new(
                CommandSpec::new("copy")
                    .option(OptionSpec::positional("from"))
                    .option(OptionSpec::positional("to")),
                |_| Ok(0),
            ))
            .unwrap();

        let binding = runner.bind("copy", &["a.txt".to_string()]).unwrap();
        assert!(!binding.is_ok());
        assert_eq!(binding.value("from"), Some("a.txt"));
        assert!(runner.bind("move", &[]).is_err());
    }

    #[test]
    fn test_per_command_output_override() {
        let (mut runner, default_out) = quiet_runner(RegistrationPolicy::Strict);
        let own = Rc::new(RefCell::new(MemoryOutput::new()));
        runner
            .register(ClosureCommand::new(CommandSpec::new("hello"), |ctx| {
                ctx.println(format_args!("hi"))?;
                Ok(0)
            }))
            .unwrap();
        runner.set_command_output("hello", own.clone());

        assert_eq!(runner.start(argv(&["hello"])), 0);
        assert_eq!(own.borrow().contents(), "hi\n");
        assert!(default_out.borrow().contents().is_empty());
    }

    #[test]
    fn test_runaway_delegation_is_stopped() {
        let (mut runner, out) = quiet_runner(RegistrationPolicy::Strict);
        runner
            .register(ClosureCommand::new(CommandSpec::new("again"), |ctx| {
                Ok(ctx.exec_sub_command("again", Vec::<String>::new()))
            }))
            .unwrap();

        assert_eq!(runner.start(argv(&["again"])), EXIT_EXECUTION_FAULT);
        assert!(out.borrow().contents().contains("nesting limit of 64"));
        assert_eq!(runner.args_vector(), Some(&["again".to_string()][..]));
    }
}
