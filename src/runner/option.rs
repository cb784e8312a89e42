//! Option declarations
//!
//! An [`OptionSpec`] is the contract of one command parameter. It is declared
//! once with the command and bound into an [`Argument`](crate::runner::Argument)
//! on every invocation.

use crate::runner::validator::InputValidator;

/// Prefix marking a named option on the command line
pub const FLAG_MARKER: &str = "--";

/// How an option is supplied on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Matched by position among the non-flag tokens
    Positional,
    /// `--name=value` or `--name value`
    Named,
    /// `--name`, never consumes the following token
    Flag,
}

/// Declared contract of one parameter
#[derive(Debug, Clone)]
pub struct OptionSpec {
    name: String,
    kind: OptionKind,
    description: String,
    optional: bool,
    default: String,
    allowed: Vec<String>,
    validator: Option<InputValidator>,
}

impl OptionSpec {
    /// Declare an option, inferring its kind from the name.
    ///
    /// A leading `--` makes the option named and is not part of the stored name.
    pub fn new(name: impl AsRef<str>) -> Self {
        let trimmed = name.as_ref().trim();
        match trimmed.strip_prefix(FLAG_MARKER) {
            Some(stripped) => Self::with_kind(stripped, OptionKind::Named),
            None => Self::with_kind(trimmed, OptionKind::Positional),
        }
    }

    /// Declare a positional option
    pub fn positional(name: impl AsRef<str>) -> Self {
        Self::with_kind(name.as_ref(), OptionKind::Positional)
    }

    /// Declare a named option taking a value
    pub fn named(name: impl AsRef<str>) -> Self {
        Self::with_kind(name.as_ref(), OptionKind::Named)
    }

    /// Declare an optional boolean flag
    pub fn flag(name: impl AsRef<str>) -> Self {
        Self::with_kind(name.as_ref(), OptionKind::Flag).optional(true)
    }

    fn with_kind(name: &str, kind: OptionKind) -> Self {
        let name = name.trim();
        OptionSpec {
            name: name.strip_prefix(FLAG_MARKER).unwrap_or(name).to_string(),
            kind,
            description: String::new(),
            optional: false,
            default: String::new(),
            allowed: Vec::new(),
            validator: None,
        }
    }

    pub fn description(mut self, description: impl AsRef<str>) -> Self {
        self.description = description.as_ref().trim().to_string();
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Default value used when no token supplies one. Empty means no default.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// Add one allowed value
    pub fn allow(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !self.allowed.contains(&value) {
            self.allowed.push(value);
        }
        self
    }

    /// Add several allowed values
    pub fn allowed<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().fold(self, |spec, v| spec.allow(v))
    }

    pub fn validator(mut self, validator: InputValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Declared default, if any
    pub fn get_default(&self) -> Option<&str> {
        if self.default.is_empty() {
            None
        } else {
            Some(&self.default)
        }
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed
    }

    pub fn get_validator(&self) -> Option<&InputValidator> {
        self.validator.as_ref()
    }

    /// Whether this option is written with the flag marker
    pub fn is_named(&self) -> bool {
        self.kind != OptionKind::Positional
    }

    /// Name as typed on the command line (`--name` or `name`)
    pub fn display_name(&self) -> String {
        if self.is_named() {
            format!("{}{}", FLAG_MARKER, self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Whether `name` can identify an option, a command or an alias
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Strip the flag marker from a lookup key
pub fn normalize_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix(FLAG_MARKER).unwrap_or(name)
}
