//! Command model and dispatch
//!
//! This module holds the option and command contracts, argument binding,
//! the runner that dispatches an argument vector, and declarative commands
//! built from manifests.

pub mod argument;
pub mod binding;
pub mod command;
pub mod dispatch;
pub mod interpolate;
pub mod invocation;
pub mod option;
pub mod shell;
pub mod validator;

// Re-export main types
pub use argument::*;
pub use binding::*;
pub use command::*;
pub use dispatch::*;
pub use interpolate::*;
pub use invocation::*;
pub use option::*;
pub use shell::*;
pub use validator::*;
