//! Error types for cmdkit

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cmdkit operations
pub type Result<T> = std::result::Result<T, CmdkitError>;

/// Main error type for cmdkit
#[derive(Error, Debug)]
pub enum CmdkitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Registration and dispatch errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Argument binding errors
    #[error("Binding error: {0}")]
    Bind(#[from] BindError),

    /// Stream errors
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Command discovery errors
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures while binding raw tokens to a command's options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Argument '{option}' is required but no value was supplied")]
    MissingRequired { option: String },

    #[error("Value '{value}' is not allowed for '{option}' (allowed: {})", .allowed.join(", "))]
    NotAllowed {
        option: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Argument '{option}' does not accept an empty value")]
    EmptyValue { option: String },

    #[error("{message}")]
    ValidationFailed { option: String, message: String },
}

impl BindError {
    /// Name of the option this failure refers to
    pub fn option(&self) -> &str {
        match self {
            BindError::MissingRequired { option }
            | BindError::NotAllowed { option, .. }
            | BindError::EmptyValue { option }
            | BindError::ValidationFailed { option, .. } => option,
        }
    }
}

/// Registry and dispatch failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No command was supplied.")]
    NoCommand,

    #[error("Command '{0}' is not supported.")]
    UnknownCommand(String),

    #[error("Name '{0}' is already used by another command or alias")]
    NameCollision(String),

    #[error("Invalid name '{0}': names must be non-empty and contain no whitespace")]
    InvalidName(String),

    #[error("Option '{option}' is declared twice by command '{command}'")]
    DuplicateOption { command: String, option: String },

    #[error("Sub-command '{name}' exceeds the nesting limit of {limit}")]
    NestingTooDeep { name: String, limit: usize },
}

/// Failure of an underlying input or output medium
#[derive(Error, Debug)]
#[error("I/O error: {0}")]
pub struct StreamError(#[from] pub io::Error);

impl StreamError {
    /// Kind of the wrapped I/O error
    pub fn kind(&self) -> io::ErrorKind {
        self.0.kind()
    }

    /// Error for bytes that do not form UTF-8 text
    pub fn invalid_text(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StreamError(io::Error::new(io::ErrorKind::InvalidData, error))
    }

    /// Error for a source that has nothing left to read
    pub fn exhausted() -> Self {
        StreamError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input stream is exhausted",
        ))
    }
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Command '{0}' is not defined")]
    CommandNotFound(String),

    #[error("Circular command delegation detected: {0}")]
    CircularDelegation(String),

    #[error("Failed to load manifest '{path}': {error}")]
    Manifest { path: PathBuf, error: String },
}

/// Command discovery and cache errors
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid pattern '{pattern}': {error}")]
    Pattern { pattern: String, error: String },

    #[error("Cache file '{path}' could not be used: {error}")]
    Cache { path: PathBuf, error: String },
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for binding operations
pub type BindResult<T> = std::result::Result<T, BindError>;

/// Specialized result type for stream operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;
