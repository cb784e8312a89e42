//! Variable interpolation for strings
//!
//! Declarative command steps reference bound arguments with `${name}`.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.-]*)\}").expect("variable pattern is valid")
});

/// Interpolate variables in a string
///
/// Supports:
/// - `${var}` - variable from `vars`
/// - environment variables, when `vars` has no such entry
///
/// Substituted text is not scanned again. Unknown names are left untouched.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> String {
    VARIABLE
        .replace_all(s, |caps: &Captures| {
            let name = &caps[1];
            if let Some(value) = vars.get(name) {
                return value.clone();
            }
            env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Interpolate a list of strings
pub fn interpolate_list(list: &[String], vars: &HashMap<String, String>) -> Vec<String> {
    list.iter().map(|s| interpolate(s, vars)).collect()
}
