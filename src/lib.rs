//! Provision the AWS Fargate CLI on CI runners.
//!
//! The host platform is normalized to the release naming scheme, checked
//! against the published platform matrix, and the matching release archive
//! is downloaded, extracted and registered in a directory cache. Repeat
//! requests for a cached version touch neither the network nor the archive.

pub mod actions;
pub mod cache;
pub mod compat;
pub mod config;
pub mod download;
pub mod error;
pub mod locator;
pub mod platform;
pub mod provision;
pub mod types;

pub use cache::{DirectoryCache, ToolCache};
pub use compat::CompatibilityMatrix;
pub use download::{ArtifactFetcher, HttpFetcher};
pub use error::ProvisionError;
pub use locator::ArtifactLocator;
pub use provision::ToolProvisioner;
pub use types::{PlatformDescriptor, VersionTag, TOOL_NAME};
