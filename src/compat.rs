use crate::error::ProvisionError;
use crate::types::{CanonicalArch, CanonicalOs};
use std::collections::BTreeMap;

/// Architectures published per OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityMatrix {
    allowed: BTreeMap<CanonicalOs, Vec<CanonicalArch>>,
}

impl CompatibilityMatrix {
    /// The pairs for which Fargate CLI release archives exist.
    pub fn published() -> Self {
        Self {
            allowed: BTreeMap::from([
                (CanonicalOs::Darwin, vec![CanonicalArch::Amd64]),
                (
                    CanonicalOs::Linux,
                    vec![CanonicalArch::I386, CanonicalArch::Amd64, CanonicalArch::Arm],
                ),
                (
                    CanonicalOs::Windows,
                    vec![CanonicalArch::I386, CanonicalArch::Amd64],
                ),
            ]),
        }
    }

    pub fn new<I>(entries: I) -> Result<Self, ProvisionError>
    where
        I: IntoIterator<Item = (CanonicalOs, Vec<CanonicalArch>)>,
    {
        let mut allowed = BTreeMap::new();
        for (os, arches) in entries {
            if arches.is_empty() {
                return Err(ProvisionError::InvalidMatrix { os });
            }
            allowed.insert(os, arches);
        }
        Ok(Self { allowed })
    }

    pub fn is_supported(&self, os: CanonicalOs, arch: CanonicalArch) -> bool {
        self.allowed
            .get(&os)
            .is_some_and(|arches| arches.contains(&arch))
    }

    pub fn ensure_compatible(
        &self,
        os: CanonicalOs,
        arch: CanonicalArch,
    ) -> Result<(), ProvisionError> {
        if self.is_supported(os, arch) {
            Ok(())
        } else {
            Err(ProvisionError::UnsupportedCombination { os, arch })
        }
    }

    pub fn architectures(&self, os: CanonicalOs) -> &[CanonicalArch] {
        self.allowed.get(&os).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for CompatibilityMatrix {
    fn default() -> Self {
        Self::published()
    }
}
