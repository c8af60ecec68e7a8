use crate::types::{CanonicalArch, CanonicalOs};
use std::path::PathBuf;
use thiserror::Error;

/// Which half of the platform descriptor failed to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformPart {
    Os,
    Arch,
}

impl std::fmt::Display for PlatformPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformPart::Os => f.write_str("os"),
            PlatformPart::Arch => f.write_str("arch"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{kind} value '{value}' is not supported")]
    UnsupportedPlatform { kind: PlatformPart, value: String },

    #[error("os '{os}' does not support arch '{arch}'")]
    UnsupportedCombination {
        os: CanonicalOs,
        arch: CanonicalArch,
    },

    #[error("Unable to download Fargate CLI from {url}: {reason}")]
    DownloadFailure { url: String, reason: String },

    #[error("Unable to extract {}: {reason}", .archive.display())]
    ExtractionFailure { archive: PathBuf, reason: String },

    #[error("Unable to cache {tool} {version}: {reason}")]
    CacheRegistrationFailure {
        tool: String,
        version: String,
        reason: String,
    },

    #[error("Compatibility table lists no architectures for os '{os}'")]
    InvalidMatrix { os: CanonicalOs },

    #[error("Input required and not supplied: cli-version")]
    MissingVersion,
}

impl ProvisionError {
    pub fn download(url: &str, reason: impl std::fmt::Display) -> Self {
        ProvisionError::DownloadFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn extraction(archive: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        ProvisionError::ExtractionFailure {
            archive: archive.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn registration(tool: &str, version: &str, reason: impl std::fmt::Display) -> Self {
        ProvisionError::CacheRegistrationFailure {
            tool: tool.to_string(),
            version: version.to_string(),
            reason: reason.to_string(),
        }
    }
}
