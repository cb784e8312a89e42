//! Bound arguments

use crate::error::{BindError, BindResult};
use crate::runner::option::{OptionKind, OptionSpec};
use crate::runner::validator::InputValidator;

/// One option bound within one invocation.
///
/// Starts as a copy of the option's constraints, which can be overridden
/// locally without touching the declaration.
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    kind: OptionKind,
    value: Option<String>,
    optional: bool,
    allowed: Vec<String>,
    validator: Option<InputValidator>,
}

impl Argument {
    /// Unset argument mirroring `spec`
    pub fn from_spec(spec: &OptionSpec) -> Self {
        Argument {
            name: spec.name().to_string(),
            kind: spec.kind(),
            value: None,
            optional: spec.is_optional(),
            allowed: spec.allowed_values().to_vec(),
            validator: spec.get_validator().cloned(),
        }
    }

    /// Set the value, keeping the previous one when the new value is rejected
    pub fn set_value(&mut self, value: impl Into<String>) -> BindResult<()> {
        let value = value.into();
        self.check(&value)?;
        self.value = Some(value);
        Ok(())
    }

    fn check(&self, value: &str) -> BindResult<()> {
        if !self.allowed.is_empty() && !self.allowed.iter().any(|v| v == value) {
            return Err(BindError::NotAllowed {
                option: self.name.clone(),
                value: value.to_string(),
                allowed: self.allowed.clone(),
            });
        }

        if value.is_empty() && !self.optional {
            return Err(BindError::EmptyValue {
                option: self.name.clone(),
            });
        }

        if let Some(validator) = &self.validator {
            if !validator.is_valid(value) {
                let message = if validator.error_prompt().is_empty() {
                    format!("Invalid value for '{}'", self.name)
                } else {
                    validator.error_prompt().to_string()
                };
                return Err(BindError::ValidationFailed {
                    option: self.name.clone(),
                    message,
                });
            }
        }

        Ok(())
    }

    /// Drop the value
    pub fn reset(&mut self) {
        self.value = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed
    }

    pub fn set_optional(&mut self, optional: bool) {
        self.optional = optional;
    }

    pub fn set_allowed<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
    }

    pub fn set_validator(&mut self, validator: Option<InputValidator>) {
        self.validator = validator;
    }
}
