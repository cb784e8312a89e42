//! Configuration validation
//!
//! This module provides validation logic for configuration files and
//! command manifests.

use crate::config::types::{CommandManifest, Config};
use crate::error::{ConfigError, ConfigResult};
use crate::runner::{is_valid_name, normalize_name, InputValidator};
use std::collections::{HashMap, HashSet};

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() {
            return Err(ConfigError::Invalid(
                "interpreter must name at least a program".to_string(),
            ));
        }
    }

    if let Some(discovery) = &config.discovery {
        if discovery.dir.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.dir must not be empty".to_string(),
            ));
        }
    }

    for manifest in config.commands.values() {
        validate_manifest(manifest)?;
    }

    if config.strict {
        detect_name_collisions(config)?;
    }

    // Check for cycles between inline commands
    detect_circular_delegation(config)?;

    Ok(())
}

/// Validate a single command manifest
pub fn validate_manifest(manifest: &CommandManifest) -> ConfigResult<()> {
    if !is_valid_name(&manifest.name) {
        return Err(ConfigError::Invalid(format!(
            "Invalid command name '{}'",
            manifest.name
        )));
    }

    for alias in &manifest.aliases {
        if !is_valid_name(alias) {
            return Err(ConfigError::Invalid(format!(
                "Invalid alias '{}' for command '{}'",
                alias, manifest.name
            )));
        }
    }

    let mut seen = HashSet::new();
    for option in &manifest.options {
        let name = normalize_name(&option.name);
        if !is_valid_name(name) {
            return Err(ConfigError::Invalid(format!(
                "Invalid option name '{}' in command '{}'",
                option.name, manifest.name
            )));
        }
        if !seen.insert(name) {
            return Err(ConfigError::Invalid(format!(
                "Option '{}' is declared twice in command '{}'",
                name, manifest.name
            )));
        }
        if let Some(validator) = &option.validator {
            validate_validator_name(validator)?;
        }
    }

    Ok(())
}

/// Validate a validator name
fn validate_validator_name(name: &str) -> ConfigResult<()> {
    match InputValidator::by_name(name) {
        Some(_) => Ok(()),
        None => Err(ConfigError::Invalid(format!(
            "Invalid validator: {}. Must be one of: integer, float, class-name, namespace",
            name
        ))),
    }
}

/// Reject a name or alias used twice among inline commands
fn detect_name_collisions(config: &Config) -> ConfigResult<()> {
    let mut taken = HashSet::new();
    for manifest in config.commands.values() {
        for name in std::iter::once(&manifest.name).chain(manifest.aliases.iter()) {
            if !taken.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Name '{}' is used by more than one command",
                    name
                )));
            }
        }
    }
    Ok(())
}

/// Detect cycles among `task:` steps of inline commands
fn detect_circular_delegation(config: &Config) -> ConfigResult<()> {
    let mut aliases = HashMap::new();
    for manifest in config.commands.values() {
        for alias in &manifest.aliases {
            aliases.insert(alias.as_str(), manifest.name.as_str());
        }
    }

    let mut visited = HashSet::new();
    for name in config.commands.keys() {
        let mut stack = Vec::new();
        check_cycle(config, &aliases, name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in command delegation
fn check_cycle<'a>(
    config: &'a Config,
    aliases: &HashMap<&'a str, &'a str>,
    name: &'a str,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> ConfigResult<()> {
    // Check if we've found a cycle
    if stack.contains(&name) {
        stack.push(name);
        return Err(ConfigError::CircularDelegation(stack.join(" -> ")));
    }

    // Skip if already fully processed
    if visited.contains(name) {
        return Ok(());
    }

    // Targets outside the config may come from discovery
    let Some(manifest) = config.commands.get(name) else {
        return Ok(());
    };

    stack.push(name);
    for target in manifest.run.iter().filter_map(|step| step.task_name()) {
        let target = aliases.get(target).copied().unwrap_or(target);
        check_cycle(config, aliases, target, visited, stack)?;
    }

    // Remove from stack and mark as visited
    stack.pop();
    visited.insert(name);

    Ok(())
}
