//! Release download addresses for the Fargate CLI.
//!
//! Addresses are built by plain interpolation. Callers normalize the
//! platform and check it against the compatibility matrix first.

use crate::types::{CanonicalArch, CanonicalOs, VersionTag};

const RELEASE_HOST: &str = "github.com";
const RELEASE_ORG: &str = "awslabs";
const RELEASE_REPO: &str = "fargatecli";
const ARTIFACT_PREFIX: &str = "fargate";

#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactLocator;

impl ArtifactLocator {
    /// File name of the release archive, e.g. `fargate-v1.2.3-linux-amd64.zip`
    pub fn archive_name(&self, os: CanonicalOs, arch: CanonicalArch, version: &VersionTag) -> String {
        format!("{}-{}-{}-{}.zip", ARTIFACT_PREFIX, version, os, arch)
    }

    pub fn build_download_url(
        &self,
        os: CanonicalOs,
        arch: CanonicalArch,
        version: &VersionTag,
    ) -> String {
        format!(
            "https://{}/{}/{}/releases/download/{}/{}",
            RELEASE_HOST,
            RELEASE_ORG,
            RELEASE_REPO,
            version,
            self.archive_name(os, arch, version)
        )
    }
}
