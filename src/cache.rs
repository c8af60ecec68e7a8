//! Directory cache keyed by tool name and version.
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/<tool>/<version>/                      extracted release contents
//! <root>/<tool>/.records/<version>.complete     JSON `CacheRecord`
//! ```
//!
//! Version directories use `VersionTag::sanitized`, which never starts
//! with `.`, so they cannot clash with the records directory or with
//! staging directories. An entry only counts once its record exists and
//! names the requested version. The record is written last, so an
//! interrupted registration is never found.

use crate::error::ProvisionError;
use crate::types::{CacheRecord, VersionTag};
use chrono::Utc;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;

const RECORDS_DIR: &str = ".records";
const COMPLETE_SUFFIX: &str = "complete";
const PUBLISH_ATTEMPTS: usize = 5;

pub trait ToolCache: Send + Sync {
    /// Directory of a completed entry, if one exists.
    fn find(&self, tool_name: &str, version: &VersionTag) -> Option<PathBuf>;

    /// Copy `source` into the cache under (`tool_name`, `version`) and
    /// return the cached directory. Replaces any previous entry.
    fn register_directory(
        &self,
        source: &Path,
        tool_name: &str,
        version: &VersionTag,
    ) -> Result<PathBuf, ProvisionError>;

    /// Versions with a completed entry for `tool_name`, sorted.
    fn versions(&self, tool_name: &str) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct DirectoryCache {
    root: PathBuf,
}

impl DirectoryCache {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = std::path::absolute(root.into())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, tool_name: &str, version: &VersionTag) -> PathBuf {
        self.root.join(tool_name).join(version.sanitized())
    }

    fn records_dir(&self, tool_name: &str) -> PathBuf {
        self.root.join(tool_name).join(RECORDS_DIR)
    }

    fn marker_path(&self, tool_name: &str, version: &VersionTag) -> PathBuf {
        self.records_dir(tool_name)
            .join(format!("{}.{}", version.sanitized(), COMPLETE_SUFFIX))
    }

    fn read_record(path: &Path) -> Option<CacheRecord> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache record {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Move `staging` to `entry_dir`. An existing directory is first moved
    /// aside into a scratch directory under `tool_dir` and deleted only
    /// after the new one is in place.
    fn swap_into_place(staging: &Path, entry_dir: &Path, tool_dir: &Path) -> io::Result<()> {
        let mut retired = None;
        if entry_dir.exists() {
            let scratch = TempDir::new_in(tool_dir)?;
            match fs::rename(entry_dir, scratch.path().join("previous")) {
                Ok(()) => retired = Some(scratch),
                // Another registration moved it first
                Err(_) if !entry_dir.exists() => {}
                Err(e) => return Err(e),
            }
        }
        fs::rename(staging, entry_dir)?;
        drop(retired);
        Ok(())
    }

    /// Write the record through a temporary file so readers never see a
    /// partial one.
    fn write_record(
        &self,
        tool_name: &str,
        version: &VersionTag,
        entry_dir: &Path,
    ) -> io::Result<()> {
        let records_dir = self.records_dir(tool_name);
        fs::create_dir_all(&records_dir)?;

        let record = CacheRecord {
            tool_name: tool_name.to_string(),
            version: version.as_str().to_string(),
            path: entry_dir.to_string_lossy().to_string(),
            registered_at: Utc::now().to_rfc3339(),
        };
        let content = serde_json::to_string_pretty(&record)?;

        let mut file = NamedTempFile::new_in(&records_dir)?;
        file.write_all(content.as_bytes())?;
        file.persist(self.marker_path(tool_name, version))
            .map_err(|e| e.error)?;
        Ok(())
    }
}

impl ToolCache for DirectoryCache {
    fn find(&self, tool_name: &str, version: &VersionTag) -> Option<PathBuf> {
        let dir = self.entry_dir(tool_name, version);
        let marker = self.marker_path(tool_name, version);

        let Some(record) = Self::read_record(&marker) else {
            tracing::debug!("No cache entry for {} {}", tool_name, version);
            return None;
        };
        if record.version != version.as_str() {
            tracing::warn!(
                "Cache record {} is for version {}, not {}",
                marker.display(),
                record.version,
                version
            );
            return None;
        }
        if !dir.is_dir() {
            tracing::warn!(
                "Cache record for {} {} points at missing directory {}",
                tool_name,
                version,
                dir.display()
            );
            return None;
        }

        tracing::debug!("Cache hit for {} {}: {}", tool_name, version, dir.display());
        Some(dir)
    }

    fn register_directory(
        &self,
        source: &Path,
        tool_name: &str,
        version: &VersionTag,
    ) -> Result<PathBuf, ProvisionError> {
        let fail =
            |reason: String| ProvisionError::registration(tool_name, version.as_str(), reason);

        if !source.is_dir() {
            return Err(fail(format!("{} is not a directory", source.display())));
        }

        let tool_dir = self.root.join(tool_name);
        fs::create_dir_all(&tool_dir)
            .map_err(|e| fail(format!("cannot create {}: {}", tool_dir.display(), e)))?;

        // Stage next to the final location so the move is a rename
        let staging = TempDir::new_in(&tool_dir)
            .map_err(|e| fail(format!("cannot create staging directory: {}", e)))?;
        copy_dir(source, staging.path()).map_err(|e| fail(e.to_string()))?;

        let entry_dir = self.entry_dir(tool_name, version);
        let mut attempt = 1;
        loop {
            match Self::swap_into_place(staging.path(), &entry_dir, &tool_dir) {
                Ok(()) => break,
                Err(e) if attempt < PUBLISH_ATTEMPTS => {
                    // Lost a race with another registration of this entry
                    if let Some(existing) = self.find(tool_name, version) {
                        tracing::debug!(
                            "{} {} was registered concurrently, using {}",
                            tool_name,
                            version,
                            existing.display()
                        );
                        return Ok(existing);
                    }
                    tracing::debug!("Retrying move into {}: {}", entry_dir.display(), e);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(fail(format!(
                        "cannot move {} to {}: {}",
                        staging.path().display(),
                        entry_dir.display(),
                        e
                    )))
                }
            }
        }

        // Without a record the directory is not an entry, so leave it for
        // the next registration to replace
        self.write_record(tool_name, version, &entry_dir)
            .map_err(|e| {
                fail(format!(
                    "cannot write {}: {}",
                    self.marker_path(tool_name, version).display(),
                    e
                ))
            })?;

        tracing::info!("Cached {} {} at {}", tool_name, version, entry_dir.display());
        Ok(entry_dir)
    }

    fn versions(&self, tool_name: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.records_dir(tool_name)) else {
            return Vec::new();
        };

        let mut versions: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some(COMPLETE_SUFFIX))
            .filter_map(|p| Self::read_record(&p))
            .filter_map(|record| VersionTag::parse(&record.version).ok())
            .filter(|version| self.find(tool_name, version).is_some())
            .map(|version| version.as_str().to_string())
            .collect();

        versions.sort();
        versions.dedup();
        versions
    }
}

fn copy_dir(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
