//! Command discovery
//!
//! Manifest files in a directory become commands. Their parsed metadata is
//! cached in a JSON file and reused until a scanned file changes.

pub mod cache;
pub mod scan;

pub use cache::*;
pub use scan::*;
