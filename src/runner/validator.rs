//! Input validators
//!
//! An [`InputValidator`] pairs a predicate with the message shown when the
//! predicate rejects a value. The standard checks are plain functions so they
//! can be used on their own.

use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a value is acceptable
pub type ValidatorFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A reusable value check with its error prompt
#[derive(Clone)]
pub struct InputValidator {
    predicate: ValidatorFn,
    error_prompt: String,
}

impl InputValidator {
    /// Validator from an arbitrary predicate
    pub fn new<F>(predicate: F, error_prompt: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        InputValidator {
            predicate: Arc::new(predicate),
            error_prompt: error_prompt.into().trim().to_string(),
        }
    }

    /// Accepts unsigned integers
    pub fn integer() -> Self {
        Self::new(is_integer, "The value must be an integer.")
    }

    /// Accepts integers and decimal numbers
    pub fn float() -> Self {
        Self::new(is_float, "The value must be a number.")
    }

    /// Accepts identifiers such as `MyCommand`
    pub fn class_name() -> Self {
        Self::new(is_class_name, "The value is not a valid name.")
    }

    /// Accepts `\`-separated identifiers such as `App\Commands`
    pub fn namespace() -> Self {
        Self::new(is_namespace, "The value is not a valid namespace.")
    }

    /// Look up a standard validator by its config name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "int" | "integer" => Some(Self::integer()),
            "float" | "number" => Some(Self::float()),
            "class" | "class-name" => Some(Self::class_name()),
            "namespace" => Some(Self::namespace()),
            _ => None,
        }
    }

    /// Replace the error prompt
    pub fn with_error_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.error_prompt = prompt.into().trim().to_string();
        self
    }

    /// Run the predicate
    pub fn is_valid(&self, value: &str) -> bool {
        (self.predicate)(value)
    }

    /// Configured error prompt, possibly empty
    pub fn error_prompt(&self) -> &str {
        &self.error_prompt
    }
}

impl fmt::Debug for InputValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputValidator")
            .field("error_prompt", &self.error_prompt)
            .finish_non_exhaustive()
    }
}

/// Non-empty and made only of ASCII digits
pub fn is_integer(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// An integer, or two integers joined by a single `.`
pub fn is_float(value: &str) -> bool {
    match value.split_once('.') {
        None => is_integer(value),
        Some((whole, fraction)) => is_integer(whole) && is_integer(fraction),
    }
}

/// Non-empty, does not start with a digit, only alphanumerics and `_`
pub fn is_class_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if !first.is_ascii_digit() && is_name_char(first) => {
            chars.all(is_name_char)
        }
        _ => false,
    }
}

/// Class names separated by single backslashes
pub fn is_namespace(value: &str) -> bool {
    value.split('\\').all(is_class_name)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
