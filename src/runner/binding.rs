//! Binding raw tokens to declared options

use crate::error::BindError;
use crate::runner::argument::Argument;
use crate::runner::option::{OptionKind, OptionSpec, FLAG_MARKER};
use std::collections::HashMap;
use tracing::debug;

/// Tokens split into positional values and named values
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub positional: Vec<String>,
    pub named: HashMap<String, String>,
}

/// Result of binding one invocation's tokens
#[derive(Debug, Clone)]
pub struct Binding {
    /// One argument per option, in declaration order, bound or not
    pub arguments: Vec<Argument>,
    /// Every failure met while binding
    pub errors: Vec<BindError>,
}

impl Binding {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(Argument::value)
    }
}

/// Whether `token` is written like a flag
pub fn is_flag_token(token: &str) -> bool {
    token.starts_with(FLAG_MARKER)
}

/// Split tokens using the declared options to decide what a flag consumes
pub fn tokenize(options: &[OptionSpec], tokens: &[String]) -> Tokens {
    let mut parsed = Tokens::default();
    let mut only_positional = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if only_positional || !is_flag_token(token) {
            parsed.positional.push(token.clone());
            continue;
        }

        if token == FLAG_MARKER {
            only_positional = true;
            continue;
        }

        let body = &token[FLAG_MARKER.len()..];
        let (name, inline_value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (body, None),
        };

        let Some(spec) = options
            .iter()
            .find(|o| o.is_named() && o.name() == name)
        else {
            debug!("ignoring undeclared flag '{}'", token);
            continue;
        };

        let value = match inline_value {
            Some(value) => value,
            None if spec.kind() == OptionKind::Named
                && i < tokens.len()
                && !is_flag_token(&tokens[i]) =>
            {
                i += 1;
                tokens[i - 1].clone()
            }
            None => String::new(),
        };

        parsed.named.insert(name.to_string(), value);
    }

    parsed
}

/// Bind `tokens` against `options`.
///
/// Every option is resolved even after a failure, so the result can be
/// inspected; the invocation must not run unless [`Binding::is_ok`].
pub fn bind(options: &[OptionSpec], tokens: &[String]) -> Binding {
    let parsed = tokenize(options, tokens);
    let mut positional = parsed.positional.into_iter();
    let mut arguments = Vec::with_capacity(options.len());
    let mut errors = Vec::new();

    for spec in options {
        let mut argument = Argument::from_spec(spec);

        let supplied = match spec.kind() {
            OptionKind::Positional => positional.next(),
            OptionKind::Named | OptionKind::Flag => parsed.named.get(spec.name()).cloned(),
        };
        let resolved = supplied.or_else(|| spec.get_default().map(str::to_string));

        match resolved {
            Some(value) => {
                if let Err(e) = argument.set_value(value) {
                    errors.push(e);
                }
            }
            None if !spec.is_optional() => errors.push(BindError::MissingRequired {
                option: spec.name().to_string(),
            }),
            None => {}
        }

        arguments.push(argument);
    }

    let surplus: Vec<String> = positional.collect();
    if !surplus.is_empty() {
        debug!("ignoring surplus positional tokens: {:?}", surplus);
    }

    Binding { arguments, errors }
}
