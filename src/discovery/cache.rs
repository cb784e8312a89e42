//! Persisted discovery metadata
//!
//! The cache records every scanned manifest with its modification time next
//! to the commands parsed from it. It is trusted only while the recorded
//! timestamps still match the files on disk.

use crate::config::CommandManifest;
use crate::error::DiscoveryError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

/// File modification time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Stamp {
    /// Current modification time of `path`
    pub fn of(path: &Path) -> io::Result<Self> {
        let modified = fs::metadata(path)?.modified()?;
        let since = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
        Ok(Stamp {
            secs: since.as_secs(),
            nanos: since.subsec_nanos(),
        })
    }
}

/// Scanned files and the commands extracted from them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataCache {
    pub files: BTreeMap<PathBuf, Stamp>,
    pub commands: Vec<CommandManifest>,
}

impl MetadataCache {
    /// Read a cache file. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, DiscoveryError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(cache_error(path, e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| cache_error(path, e))
    }

    /// Write the cache, creating its directory when needed
    pub fn save(&self, path: &Path) -> Result<(), DiscoveryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| cache_error(path, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| cache_error(path, e))?;
        fs::write(path, json).map_err(|e| cache_error(path, e))
    }

    /// Whether any recorded file disappeared or changed
    pub fn is_stale(&self) -> bool {
        self.files.iter().any(|(path, recorded)| match Stamp::of(path) {
            Ok(live) => live != *recorded,
            Err(_) => {
                debug!("cached file {} is gone", path.display());
                true
            }
        })
    }

    /// Whether the cache no longer describes exactly the `live` file set
    pub fn is_stale_against(&self, live: &BTreeMap<PathBuf, Stamp>) -> bool {
        self.files != *live
    }
}

/// Cache location for a discovery directory when the config names none
pub fn default_cache_path(dir: &Path) -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "cmdkit")?;
    let mut hasher = DefaultHasher::new();
    dir.hash(&mut hasher);
    Some(
        dirs.cache_dir()
            .join(format!("discovery-{:016x}.json", hasher.finish())),
    )
}

fn cache_error(path: &Path, error: impl ToString) -> DiscoveryError {
    DiscoveryError::Cache {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}
