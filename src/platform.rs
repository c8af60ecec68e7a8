use crate::error::{PlatformPart, ProvisionError};
use crate::types::*;

/// Describe the running host using the raw token vocabulary the
/// normalizer understands. Unknown values are passed through unchanged so
/// that normalization reports them.
pub fn host_platform() -> PlatformDescriptor {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    let raw_os = match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };

    let raw_arch = match arch {
        "x86_64" => "x64",
        "x86" => "x32",
        "aarch64" => "arm64",
        other => other,
    };

    tracing::debug!(
        "Host platform {}/{} reported as {}/{}",
        os,
        arch,
        raw_os,
        raw_arch
    );

    PlatformDescriptor::new(raw_os, raw_arch)
}

pub fn normalize_os(raw: &str) -> Result<CanonicalOs, ProvisionError> {
    match raw {
        "darwin" => Ok(CanonicalOs::Darwin),
        "linux" => Ok(CanonicalOs::Linux),
        "win32" => Ok(CanonicalOs::Windows),
        _ => Err(ProvisionError::UnsupportedPlatform {
            kind: PlatformPart::Os,
            value: raw.to_string(),
        }),
    }
}

pub fn normalize_arch(raw: &str) -> Result<CanonicalArch, ProvisionError> {
    match raw {
        "arm64" => Ok(CanonicalArch::Arm64),
        "arm" => Ok(CanonicalArch::Arm),
        "x32" => Ok(CanonicalArch::I386),
        "x64" => Ok(CanonicalArch::Amd64),
        _ => Err(ProvisionError::UnsupportedPlatform {
            kind: PlatformPart::Arch,
            value: raw.to_string(),
        }),
    }
}

pub fn normalize(platform: &PlatformDescriptor) -> Result<CanonicalPlatform, ProvisionError> {
    let os = normalize_os(&platform.raw_os)?;
    let arch = normalize_arch(&platform.raw_arch)?;
    tracing::trace!(
        "Normalized {}/{} to {}-{}",
        platform.raw_os,
        platform.raw_arch,
        os,
        arch
    );
    Ok(CanonicalPlatform { os, arch })
}
