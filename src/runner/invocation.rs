//! Per-invocation context
//!
//! The invocation carries everything a command body sees while it runs: the
//! bound arguments, the streams and the runner that dispatched it.

use crate::error::StreamResult;
use crate::io::{OutputStream, SharedInput, SharedOutput, Style};
use crate::runner::argument::Argument;
use crate::runner::dispatch::Runner;
use crate::runner::option::normalize_name;
use crate::runner::validator::InputValidator;
use colored::Color;
use std::fmt;

/// Context of one command execution
pub struct Invocation<'r> {
    runner: &'r mut Runner,
    command: String,
    arguments: Vec<Argument>,
    output: SharedOutput,
    input: SharedInput,
}

impl<'r> Invocation<'r> {
    pub(crate) fn new(
        runner: &'r mut Runner,
        command: String,
        arguments: Vec<Argument>,
        output: SharedOutput,
        input: SharedInput,
    ) -> Self {
        Invocation {
            runner,
            command,
            arguments,
            output,
            input,
        }
    }

    /// Canonical name of the running command
    pub fn command_name(&self) -> &str {
        &self.command
    }

    /// The runner that dispatched this invocation
    pub fn runner(&self) -> &Runner {
        &*self.runner
    }

    /// The runner's current argument vector
    pub fn args_vector(&self) -> Option<&[String]> {
        self.runner.args_vector()
    }

    /// All bound arguments, command options first, then global options
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Look up an argument by name, with or without the flag marker
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        let name = normalize_name(name);
        self.arguments.iter().find(|a| a.name() == name)
    }

    pub fn argument_mut(&mut self, name: &str) -> Option<&mut Argument> {
        let name = normalize_name(name);
        self.arguments.iter_mut().find(|a| a.name() == name)
    }

    /// Bound value of an argument, `None` when unset or undeclared
    pub fn value(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(Argument::value)
    }

    /// Whether an argument received a value (flags bind to an empty one)
    pub fn is_set(&self, name: &str) -> bool {
        self.argument(name).is_some_and(Argument::is_set)
    }

    /// Run another registered command with its own argument list.
    ///
    /// The runner's argument vector is swapped for `[name, args..]` while the
    /// sub-command runs and put back afterwards.
    pub fn exec_sub_command<I, S>(&mut self, name: &str, args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .exec_sub_command(name, args.into_iter().map(Into::into).collect())
    }

    /// Shared handle on the output stream
    pub fn output(&self) -> SharedOutput {
        self.output.clone()
    }

    /// Shared handle on the input stream
    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }

    pub fn write(&self, args: fmt::Arguments<'_>, style: Style) -> StreamResult<()> {
        self.output.borrow_mut().write_styled(args, style)
    }

    pub fn print(&self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        self.output.borrow_mut().print(args)
    }

    pub fn println(&self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        self.output.borrow_mut().println(args)
    }

    /// `Error: ` in red, then the message
    pub fn error(&self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        write_labeled(&mut *self.output.borrow_mut(), "Error", Color::Red, args)
    }

    /// `Success: ` in green, then the message
    pub fn success(&self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        write_labeled(&mut *self.output.borrow_mut(), "Success", Color::Green, args)
    }

    /// `Warning: ` in yellow, then the message
    pub fn warning(&self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        write_labeled(&mut *self.output.borrow_mut(), "Warning", Color::Yellow, args)
    }

    /// `Info: ` in blue, then the message
    pub fn info(&self, args: fmt::Arguments<'_>) -> StreamResult<()> {
        write_labeled(&mut *self.output.borrow_mut(), "Info", Color::Blue, args)
    }

    pub fn read_line(&self) -> StreamResult<String> {
        self.input.borrow_mut().read_line()
    }

    pub fn read(&self, bytes: usize) -> StreamResult<String> {
        self.input.borrow_mut().read(bytes)
    }

    /// Ask a question until the answer is acceptable.
    ///
    /// An empty answer takes `default`; with no default it is asked again.
    pub fn prompt(
        &self,
        question: &str,
        default: Option<&str>,
        validator: Option<&InputValidator>,
    ) -> StreamResult<String> {
        loop {
            match default {
                Some(default) => self.write(
                    format_args!("{} [{}] ", question, default),
                    Style::color(Color::Cyan),
                )?,
                None => self.write(format_args!("{} ", question), Style::color(Color::Cyan))?,
            }
            self.output.borrow_mut().flush()?;

            let line = self.read_line()?;
            let answer = match line.trim() {
                "" => match default {
                    Some(default) => default,
                    None => continue,
                },
                answer => answer,
            };

            match validator {
                Some(validator) if !validator.is_valid(answer) => {
                    let message = if validator.error_prompt().is_empty() {
                        "Invalid answer."
                    } else {
                        validator.error_prompt()
                    };
                    self.error(format_args!("{}", message))?;
                }
                _ => return Ok(answer.to_string()),
            }
        }
    }

    /// Ask a yes/no question
    pub fn confirm(&self, question: &str, default: bool) -> StreamResult<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            self.write(
                format_args!("{} ({}) ", question, hint),
                Style::color(Color::Cyan),
            )?;
            self.output.borrow_mut().flush()?;

            match self.read_line()?.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.error(format_args!("Answer with y or n."))?,
            }
        }
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("command", &self.command)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Write `label: ` in bold color followed by the message and a line break
pub(crate) fn write_labeled(
    out: &mut dyn OutputStream,
    label: &str,
    color: Color,
    args: fmt::Arguments<'_>,
) -> StreamResult<()> {
    out.write_styled(format_args!("{}: ", label), Style::color(color).bold())?;
    out.println(args)
}
