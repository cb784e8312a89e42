//! cmdkit - a small framework for command-line applications
//!
//! Commands declare their options, a [`runner::Runner`] dispatches an
//! argument vector to them and maps every outcome to an exit code. Commands
//! can also be declared in YAML, inline in `cmdkit.yml` or one per file in a
//! discovery directory.

// Public modules
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod io;
pub mod logging;
pub mod runner;

// Re-export commonly used types
pub use error::{CmdkitError, Result};

/// Current version of cmdkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
