//! Command contract
//!
//! A command describes itself through a [`CommandSpec`] and runs through
//! [`Command::exec`]. Bound values live in the [`Invocation`], not in the
//! command, so one instance can be invoked any number of times, including
//! from inside its own body.

use crate::error::DispatchError;
use crate::runner::invocation::Invocation;
use crate::runner::option::{is_valid_name, normalize_name, OptionSpec};
use std::collections::HashSet;
use std::fmt;

/// Self-description of a command: identity, help metadata and options
#[derive(Debug, Clone)]
pub struct CommandSpec {
    name: String,
    description: String,
    group: Option<String>,
    aliases: Vec<String>,
    hidden: bool,
    options: Vec<OptionSpec>,
}

impl CommandSpec {
    pub fn new(name: impl AsRef<str>) -> Self {
        CommandSpec {
            name: name.as_ref().trim().to_string(),
            description: String::new(),
            group: None,
            aliases: Vec::new(),
            hidden: false,
            options: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl AsRef<str>) -> Self {
        self.description = description.as_ref().trim().to_string();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn alias(mut self, alias: impl AsRef<str>) -> Self {
        let alias = alias.as_ref().trim().to_string();
        if alias != self.name && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    pub fn aliases<I, S>(self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        aliases.into_iter().fold(self, |spec, a| spec.alias(a))
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = OptionSpec>,
    {
        self.options.extend(options);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Declared options, in declaration order
    pub fn get_options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Look up an option by name, with or without the flag marker
    pub fn get_option(&self, name: &str) -> Option<&OptionSpec> {
        let name = normalize_name(name);
        self.options.iter().find(|o| o.name() == name)
    }

    /// Check names and option uniqueness
    pub fn validate(&self) -> Result<(), DispatchError> {
        if !is_valid_name(&self.name) {
            return Err(DispatchError::InvalidName(self.name.clone()));
        }

        for alias in &self.aliases {
            if !is_valid_name(alias) {
                return Err(DispatchError::InvalidName(alias.clone()));
            }
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if !is_valid_name(option.name()) {
                return Err(DispatchError::InvalidName(option.name().to_string()));
            }
            if !seen.insert(option.name()) {
                return Err(DispatchError::DuplicateOption {
                    command: self.name.clone(),
                    option: option.name().to_string(),
                });
            }
        }

        Ok(())
    }
}

/// A named unit of work the runner can dispatch to
pub trait Command {
    /// Describe this command
    fn spec(&self) -> &CommandSpec;

    /// Run the command body and return its exit code.
    ///
    /// Errors and panics are caught by the runner and turned into a failure code.
    fn exec(&self, ctx: &mut Invocation<'_>) -> anyhow::Result<i32>;

    fn name(&self) -> &str {
        self.spec().name()
    }
}

/// Body signature of a [`ClosureCommand`]
pub type CommandBody = Box<dyn Fn(&mut Invocation<'_>) -> anyhow::Result<i32>>;

/// A command whose body is a closure
pub struct ClosureCommand {
    spec: CommandSpec,
    body: CommandBody,
}

impl ClosureCommand {
    pub fn new<F>(spec: CommandSpec, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> anyhow::Result<i32> + 'static,
    {
        ClosureCommand {
            spec,
            body: Box::new(body),
        }
    }
}

impl Command for ClosureCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn exec(&self, ctx: &mut Invocation<'_>) -> anyhow::Result<i32> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for ClosureCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureCommand")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}
