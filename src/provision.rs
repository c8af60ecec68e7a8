//! Acquire-or-reuse sequence for a release of the Fargate CLI.
//!
//! A request walks `CacheCheck -> Resolving -> Downloading -> Extracting ->
//! Registering`. A cache hit short-circuits after the first step. Any
//! failure abandons the request and nothing is registered, so the next
//! call starts again from scratch.

use crate::cache::ToolCache;
use crate::compat::CompatibilityMatrix;
use crate::download::{extract_zip, ArtifactFetcher};
use crate::error::ProvisionError;
use crate::locator::ArtifactLocator;
use crate::platform::normalize;
use crate::types::{PlatformDescriptor, VersionTag};
use std::path::PathBuf;
use tempfile::TempDir;

/// Where a resolved release lives upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,
    pub archive_name: String,
}

/// Normalize `platform`, gate it on `matrix` and build the download URL.
/// Nothing reaches the network for a pair the matrix rejects.
pub fn resolve_artifact(
    platform: &PlatformDescriptor,
    matrix: &CompatibilityMatrix,
    version: &VersionTag,
) -> Result<ResolvedArtifact, ProvisionError> {
    let platform = normalize(platform)?;
    matrix.ensure_compatible(platform.os, platform.arch)?;

    let locator = ArtifactLocator;
    Ok(ResolvedArtifact {
        url: locator.build_download_url(platform.os, platform.arch, version),
        archive_name: locator.archive_name(platform.os, platform.arch, version),
    })
}

pub struct ToolProvisioner<C, F> {
    platform: PlatformDescriptor,
    matrix: CompatibilityMatrix,
    cache: C,
    fetcher: F,
    temp_root: PathBuf,
}

impl<C: ToolCache, F: ArtifactFetcher> ToolProvisioner<C, F> {
    pub fn new(platform: PlatformDescriptor, cache: C, fetcher: F, temp_root: PathBuf) -> Self {
        Self {
            platform,
            matrix: CompatibilityMatrix::published(),
            cache,
            fetcher,
            temp_root,
        }
    }

    pub fn with_matrix(mut self, matrix: CompatibilityMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn platform(&self) -> &PlatformDescriptor {
        &self.platform
    }

    pub fn resolve(&self, version: &VersionTag) -> Result<ResolvedArtifact, ProvisionError> {
        resolve_artifact(&self.platform, &self.matrix, version)
    }

    /// Return the directory holding `tool_name` at `version`, downloading
    /// and caching it first if needed.
    pub async fn provision(
        &self,
        tool_name: &str,
        version: &VersionTag,
    ) -> Result<PathBuf, ProvisionError> {
        if let Some(path) = self.cache.find(tool_name, version) {
            tracing::info!("Found {} {} in tool cache: {}", tool_name, version, path.display());
            return Ok(path);
        }

        tracing::debug!("{} {} not cached, resolving release", tool_name, version);
        let artifact = self.resolve(version)?;

        let work_dir = self.work_dir(tool_name, version, &artifact.url)?;
        let archive_path = work_dir.path().join(&artifact.archive_name);

        tracing::info!("Downloading Fargate CLI from {}", artifact.url);
        self.fetcher.download(&artifact.url, &archive_path).await?;

        tracing::info!("Extracting Fargate CLI zip file");
        let extract_dir = work_dir.path().join("extracted");
        let extracted = extract_in_background(archive_path, extract_dir).await?;

        let path = self
            .cache
            .register_directory(&extracted, tool_name, version)?;
        tracing::info!("Fargate CLI path is {}.", path.display());

        Ok(path)
    }

    fn work_dir(
        &self,
        tool_name: &str,
        version: &VersionTag,
        url: &str,
    ) -> Result<TempDir, ProvisionError> {
        std::fs::create_dir_all(&self.temp_root)
            .and_then(|_| {
                tempfile::Builder::new()
                    .prefix(&format!("{}-{}-", tool_name, version.sanitized()))
                    .tempdir_in(&self.temp_root)
            })
            .map_err(|e| {
                ProvisionError::download(
                    url,
                    format!(
                        "cannot create temporary directory in {}: {}",
                        self.temp_root.display(),
                        e
                    ),
                )
            })
    }
}

async fn extract_in_background(
    archive_path: PathBuf,
    extract_dir: PathBuf,
) -> Result<PathBuf, ProvisionError> {
    let archive_for_error = archive_path.clone();
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&extract_dir)
            .map_err(|e| ProvisionError::extraction(&archive_path, e))?;
        extract_zip(&archive_path, &extract_dir)
    })
    .await
    .map_err(|e| ProvisionError::extraction(&archive_for_error, e))?
}
