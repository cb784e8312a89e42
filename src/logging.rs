//! Diagnostic logging
//!
//! Diagnostics go through `tracing` to stderr. The level follows the
//! verbosity flags unless `CMDKIT_LOG` holds a filter directive.

use crate::runner::Invocation;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a log filter directive
pub const LOG_ENV: &str = "CMDKIT_LOG";

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    #[default]
    Normal = 2,
    Verbose = 3,
}

impl Verbosity {
    /// Verbosity from the state of the global flags
    pub fn from_flags(silent: bool, quiet: bool, verbose: bool) -> Self {
        if silent {
            Verbosity::Silent
        } else if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Verbosity requested on a raw argument vector
    pub fn from_args(args: &[String]) -> Self {
        let has = |flag: &str| args.iter().take_while(|a| *a != "--").any(|a| a == flag);
        Self::from_flags(has("--silent"), has("--quiet"), has("--verbose"))
    }

    /// Verbosity bound for a running command
    pub fn of(ctx: &Invocation<'_>) -> Self {
        Self::from_flags(
            ctx.is_set("silent"),
            ctx.is_set("quiet"),
            ctx.is_set("verbose"),
        )
    }

    /// Default filter directive for this level
    pub fn level(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Install the stderr subscriber.
///
/// A second call is a no-op, so tests and embedders may call it freely.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("cmdkit={}", verbosity.level())));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
