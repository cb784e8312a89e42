//! Core configuration types
//!
//! This module defines the data structures of a cmdkit.yml file and of the
//! command manifests found by discovery.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Application name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Reject name and alias collisions instead of replacing
    #[serde(default = "default_strict")]
    pub strict: bool,

    /// Command run when the argument vector names none
    #[serde(
        rename = "default-command",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_command: Option<String>,

    /// Interpreter for shell steps (e.g., ["sh", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Directory scan for manifest files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryConfig>,

    /// Commands declared inline, in help order
    #[serde(default)]
    pub commands: IndexMap<String, CommandManifest>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: None,
            usage: None,
            strict: default_strict(),
            default_command: None,
            interpreter: None,
            discovery: None,
            commands: IndexMap::new(),
        }
    }
}

fn default_strict() -> bool {
    true
}

/// Where to look for manifest files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Directory scanned for `*.yml` / `*.yaml`, relative to the config file
    pub dir: String,

    /// Metadata cache file, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,

    /// Glob patterns of files to skip
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

/// A declarative command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandManifest {
    /// Command name. Inline commands take it from their key, manifest files
    /// from their file stem when missing.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Heading the command is listed under in help
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Left out of the help listing
    #[serde(default)]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionManifest>,

    /// Steps executed in order until one fails
    #[serde(default, deserialize_with = "deserialize_steps")]
    pub run: Vec<Step>,
}

/// A declared option of a manifest command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptionManifest {
    /// Option name; a leading `--` makes it named
    pub name: String,

    /// Explicit kind, overriding the one inferred from the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<OptionKindConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Allowed values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    /// Standard validator name (integer, float, class-name, namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,

    /// Message shown when the validator rejects a value
    #[serde(
        rename = "error-prompt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_prompt: Option<String>,
}

/// Option kind as written in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKindConfig {
    Positional,
    Named,
    Flag,
}

/// One step of a manifest command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Step {
    /// Shell command string
    Shell(String),

    /// Delegate to another registered command
    Task(TaskStep),

    /// Shell command with additional settings
    Exec(ExecStep),
}

/// Delegation to another command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskStep {
    /// Name or alias of the command to run
    pub task: String,

    /// Tokens passed to it, interpolated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Detailed shell step
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecStep {
    /// The command to execute
    pub exec: String,

    /// What to print when running (defaults to exec)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print: Option<String>,

    /// Do not echo the command
    #[serde(default)]
    pub quiet: bool,

    /// Working directory for the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Step {
    /// Target of a delegation step
    pub fn task_name(&self) -> Option<&str> {
        match self {
            Step::Task(step) => Some(&step.task),
            Step::Shell(_) | Step::Exec(_) => None,
        }
    }
}

/// Custom deserializer for steps that handles both single values and arrays
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<Step>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single string command
        Value::String(s) => Ok(vec![Step::Shell(s)]),
        // Single detailed step
        Value::Mapping(_) => {
            let step = Step::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![step])
        }
        // Array of steps
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| Step::deserialize(item).map_err(D::Error::custom))
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("run must be a string, object, or array")),
    }
}
