//! Manifest directory scanning

use crate::config::{parse_manifest_file, CommandManifest};
use crate::discovery::cache::{MetadataCache, Stamp};
use crate::error::{DiscoveryError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Manifest file extensions
const MANIFEST_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Find manifest files under `dir`, skipping paths matched by `ignore`.
///
/// Ignore patterns are matched against the path relative to `dir` and
/// against the bare file name. The result is sorted.
pub fn find_manifests(dir: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let ignore = build_ignore_set(ignore)?;
    let root = glob::Pattern::escape(&dir.to_string_lossy());

    let mut found = Vec::new();
    for extension in MANIFEST_EXTENSIONS {
        let pattern = format!("{}/**/*.{}", root, extension);
        let paths = glob::glob(&pattern).map_err(|e| DiscoveryError::Pattern {
            pattern: pattern.clone(),
            error: e.to_string(),
        })?;

        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("skipping unreadable path: {}", e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(dir).unwrap_or(&path);
            let ignored = ignore.is_match(relative)
                || path.file_name().is_some_and(|name| ignore.is_match(name));
            if ignored {
                debug!("ignoring {}", path.display());
                continue;
            }
            found.push(path);
        }
    }

    found.sort();
    found.dedup();
    Ok(found)
}

/// Load the manifests under `dir`, through the cache at `cache_path` when
/// one is given.
///
/// A cache that is unreadable or out of date is rebuilt from a fresh scan.
pub fn discover(
    dir: &Path,
    cache_path: Option<&Path>,
    ignore: &[String],
) -> Result<Vec<CommandManifest>> {
    let files = find_manifests(dir, ignore)?;

    let mut live = BTreeMap::new();
    for file in &files {
        live.insert(file.clone(), Stamp::of(file)?);
    }

    if let Some(cache_path) = cache_path {
        match MetadataCache::load(cache_path) {
            Ok(Some(cache)) if !cache.is_stale_against(&live) => {
                debug!("using cached metadata from {}", cache_path.display());
                return Ok(cache.commands);
            }
            Ok(Some(_)) => debug!("cache {} is stale", cache_path.display()),
            Ok(None) => debug!("no cache at {}", cache_path.display()),
            Err(e) => warn!("{}", e),
        }
    }

    let mut commands = Vec::with_capacity(files.len());
    for file in &files {
        commands.push(parse_manifest_file(file)?);
    }
    debug!("scanned {} manifests in {}", commands.len(), dir.display());

    if let Some(cache_path) = cache_path {
        let cache = MetadataCache {
            files: live,
            commands: commands.clone(),
        };
        if let Err(e) = cache.save(cache_path) {
            warn!("{}", e);
        }
    }

    Ok(commands)
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| DiscoveryError::Pattern {
            pattern: pattern.clone(),
            error: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| {
        DiscoveryError::Pattern {
            pattern: patterns.join(", "),
            error: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CmdkitError;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_find_manifests_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "zeta.yml", "run: \"true\"\n");
        write(dir.path(), "nested/alpha.yaml", "run: \"true\"\n");
        write(dir.path(), "notes.txt", "not a manifest");

        let found = find_manifests(dir.path(), &[]).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("nested/alpha.yaml"),
                dir.path().join("zeta.yml")
            ]
        );
    }

    #[test]
    fn test_find_manifests_ignore_patterns() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "build.yml", "run: \"true\"\n");
        write(dir.path(), "wip.draft.yml", "run: \"true\"\n");
        write(dir.path(), "old/legacy.yml", "run: \"true\"\n");

        let ignore = vec!["*.draft.yml".to_string(), "old/**".to_string()];
        let found = find_manifests(dir.path(), &ignore).unwrap();
        assert_eq!(found, vec![dir.path().join("build.yml")]);
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let dir = TempDir::new().unwrap();
        let result = find_manifests(dir.path(), &["a[".to_string()]);
        assert!(matches!(
            result,
            Err(CmdkitError::Discovery(DiscoveryError::Pattern { .. }))
        ));
    }

    #[test]
    fn test_discover_writes_and_reuses_cache() {
        let dir = TempDir::new().unwrap();
        let commands = dir.path().join("commands");
        write(&commands, "lint.yml", "description: Run lints\nrun: cargo clippy\n");
        let cache_path = dir.path().join("cache.json");

        let first = discover(&commands, Some(&cache_path), &[]).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "lint");
        assert!(cache_path.is_file());

        // A doctored cache proves the second call did not rescan
        let mut cache = MetadataCache::load(&cache_path).unwrap().unwrap();
        cache.commands[0].description = Some("From cache".to_string());
        cache.save(&cache_path).unwrap();

        let second = discover(&commands, Some(&cache_path), &[]).unwrap();
        assert_eq!(second[0].description.as_deref(), Some("From cache"));
    }

    #[test]
    fn test_discover_rescans_when_files_change() {
        let dir = TempDir::new().unwrap();
        let commands = dir.path().join("commands");
        write(&commands, "lint.yml", "run: cargo clippy\n");
        let cache_path = dir.path().join("cache.json");

        discover(&commands, Some(&cache_path), &[]).unwrap();
        write(&commands, "fmt.yml", "run: cargo fmt\n");

        let names: Vec<String> = discover(&commands, Some(&cache_path), &[])
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["fmt", "lint"]);
    }

    #[test]
    fn test_discover_recovers_from_corrupt_cache() {
        let dir = TempDir::new().unwrap();
        let commands = dir.path().join("commands");
        write(&commands, "lint.yml", "run: cargo clippy\n");
        let cache_path = write(dir.path(), "cache.json", "garbage");

        let found = discover(&commands, Some(&cache_path), &[]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(MetadataCache::load(&cache_path).unwrap().is_some());
    }

    #[test]
    fn test_discover_reports_broken_manifest() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.yml", "options: 12\n");

        let result = discover(dir.path(), None, &[]);
        assert!(result.unwrap_err().to_string().contains("broken.yml"));
    }
}
