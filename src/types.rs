use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name under which the Fargate CLI is registered in the tool cache.
pub const TOOL_NAME: &str = "fargate";

/// Platform facts as reported by the host, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub raw_os: String,
    pub raw_arch: String,
}

impl PlatformDescriptor {
    pub fn new(raw_os: impl Into<String>, raw_arch: impl Into<String>) -> Self {
        Self {
            raw_os: raw_os.into(),
            raw_arch: raw_arch.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalOs {
    #[serde(rename = "darwin")]
    Darwin,
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "windows")]
    Windows,
}

impl CanonicalOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalOs::Darwin => "darwin",
            CanonicalOs::Linux => "linux",
            CanonicalOs::Windows => "windows",
        }
    }
}

impl fmt::Display for CanonicalOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalArch {
    #[serde(rename = "386")]
    I386,
    #[serde(rename = "amd64")]
    Amd64,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    Arm64,
}

impl CanonicalArch {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalArch::I386 => "386",
            CanonicalArch::Amd64 => "amd64",
            CanonicalArch::Arm => "arm",
            CanonicalArch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for CanonicalArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS and architecture spelled the way release asset names spell them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalPlatform {
    pub os: CanonicalOs,
    pub arch: CanonicalArch,
}

impl fmt::Display for CanonicalPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Release tag requested by the caller, used verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn parse(raw: &str) -> Result<Self, ProvisionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProvisionError::MissingVersion);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory-safe form of the tag. Path separators, `%` and a leading
    /// `.` are percent-encoded, so distinct tags never share a directory.
    pub fn sanitized(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        for (i, c) in self.0.chars().enumerate() {
            match c {
                '%' => out.push_str("%25"),
                '/' => out.push_str("%2F"),
                '\\' => out.push_str("%5C"),
                '.' if i == 0 => out.push_str("%2E"),
                c => out.push(c),
            }
        }
        out
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Completion record written next to every registered cache directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheRecord {
    pub tool_name: String,
    pub version: String,
    pub path: String,
    pub registered_at: String,
}
