//! Configuration parsing and validation
//!
//! This module handles parsing of cmdkit.yml configuration files and command
//! manifests, and validation of their structure.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
