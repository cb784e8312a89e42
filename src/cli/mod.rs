//! CLI application
//!
//! This module wires the configuration into a runner, registers the built-in
//! help command and runs the binary.

pub mod app;
pub mod help;

// Re-export main types
pub use app::*;
pub use help::*;
