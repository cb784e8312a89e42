//! Locating and reading cmdkit.yml and command manifests

use crate::config::types::{CommandManifest, Config};
use crate::error::{ConfigError, ConfigResult, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File names tried in every directory, in order
const CONFIG_FILE_NAMES: &[&str] = &["cmdkit.yml", "cmdkit.yaml"];

/// Find the nearest configuration file, starting from the working directory
pub fn find_config_file() -> ConfigResult<PathBuf> {
    let cwd = env::current_dir()
        .map_err(|e| ConfigError::Invalid(format!("cannot read the working directory: {}", e)))?;
    find_config_file_from(cwd)
}

/// Look for a config file in `start_dir` and then in each of its ancestors
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let candidates = start_dir
        .ancestors()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)));

    let mut searched = Vec::new();
    for candidate in candidates {
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(candidate.display().to_string());
    }
    Err(ConfigError::NotFound(searched.join(", ")))
}

/// Read and parse the config file at `path`
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_config(&contents)
}

/// Parse configuration from a string
pub fn parse_config(yaml: &str) -> Result<Config> {
    let mut config: Config = serde_yaml::from_str(yaml)?;

    // Inline commands are named by their key
    for (key, manifest) in config.commands.iter_mut() {
        if manifest.name.is_empty() {
            manifest.name = key.clone();
        } else if manifest.name != *key {
            return Err(ConfigError::Invalid(format!(
                "Command '{}' declares a different name '{}'",
                key, manifest.name
            ))
            .into());
        }
    }

    Ok(config)
}

/// Load one command manifest file
pub fn parse_manifest_file(path: &Path) -> ConfigResult<CommandManifest> {
    let manifest_error = |error: String| ConfigError::Manifest {
        path: path.to_path_buf(),
        error,
    };

    let contents = fs::read_to_string(path).map_err(|e| manifest_error(e.to_string()))?;
    let mut manifest: CommandManifest =
        serde_yaml::from_str(&contents).map_err(|e| manifest_error(e.to_string()))?;

    if manifest.name.is_empty() {
        manifest.name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| manifest_error("cannot derive a command name".to_string()))?;
    }

    Ok(manifest)
}

/// Find the nearest config file and parse it
pub fn parse_config_auto() -> Result<(Config, PathBuf)> {
    let path = find_config_file()?;
    parse_config_file(&path).map(|config| (config, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CmdkitError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_config() {
        let yaml = r#"
commands:
  hello:
    description: Say hello
    run: echo "hello"
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.commands.len(), 1);
        assert_eq!(config.commands["hello"].name, "hello");
    }

    #[test]
    fn test_parse_config_rejects_mismatched_name() {
        let yaml = r#"
commands:
  hello:
    name: goodbye
"#;
        let result = parse_config(yaml);
        assert!(matches!(
            result,
            Err(CmdkitError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_find_config_walks_up() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let outer = root.path().join("cmdkit.yaml");
        fs::write(&outer, "commands: {}\n").unwrap();
        assert_eq!(find_config_file_from(nested.clone()).unwrap(), outer);

        // The closest file wins
        let inner = root.path().join("a").join("cmdkit.yml");
        fs::write(&inner, "commands: {}\n").unwrap();
        assert_eq!(find_config_file_from(nested).unwrap(), inner);
    }

    #[test]
    fn test_missing_config_lists_candidates() {
        let root = TempDir::new().unwrap();
        match find_config_file_from(root.path().to_path_buf()) {
            Err(ConfigError::NotFound(searched)) => assert!(searched.contains("cmdkit.yml")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_with_name_and_usage() {
        let yaml = r#"
name: my-app
usage: My application
interpreter:
  - bash
  - -c
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.name, Some("my-app".to_string()));
        assert_eq!(config.usage, Some("My application".to_string()));
        assert_eq!(
            config.interpreter,
            Some(vec!["bash".to_string(), "-c".to_string()])
        );
    }

    #[test]
    fn test_manifest_name_from_file_stem() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lint.yml");
        fs::write(&path, "description: Run lints\nrun: cargo clippy\n").unwrap();

        let manifest = parse_manifest_file(&path).unwrap();
        assert_eq!(manifest.name, "lint");
        assert_eq!(manifest.description.as_deref(), Some("Run lints"));
    }

    #[test]
    fn test_manifest_parse_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.yml");
        fs::write(&path, "options: 12\n").unwrap();

        let err = parse_manifest_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Manifest { .. }));
        assert!(err.to_string().contains("broken.yml"));
    }
}
