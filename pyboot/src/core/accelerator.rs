//! Accelerator (CUDA) build selection for deep-learning frameworks.

use crate::error::BootstrapError;

/// Requested CUDA version → wheel index tag.
pub const CUDA_BUILDS: &[(&str, &str)] = &[("11.8", "cu118"), ("12.1", "cu121")];

/// Packages that ship accelerator-specific builds on the framework index.
pub const FRAMEWORK_PACKAGES: &[&str] = &["torch", "torchvision", "torchaudio"];

pub const FRAMEWORK_INDEX_URL: &str = "https://download.pytorch.org/whl";

/// Resolve the build tag for a requested CUDA version.
pub fn build_tag(requested: &str) -> Result<&'static str, BootstrapError> {
    CUDA_BUILDS
        .iter()
        .find(|(version, _)| *version == requested.trim())
        .map(|(_, tag)| *tag)
        .ok_or_else(|| BootstrapError::UnsupportedAcceleratorVersion {
            requested: requested.to_string(),
            supported: CUDA_BUILDS.iter().map(|(v, _)| v.to_string()).collect(),
        })
}

/// True if any requirement name is an accelerator-sensitive framework package.
pub fn needs_accelerator_build<S: AsRef<str>>(requirement_names: &[S]) -> bool {
    requirement_names.iter().any(|name| {
        FRAMEWORK_PACKAGES
            .iter()
            .any(|pkg| name.as_ref().eq_ignore_ascii_case(pkg))
    })
}

/// Index URL for a build tag, e.g. `.../whl/cu118`.
pub fn index_url(tag: &str) -> String {
    format!("{FRAMEWORK_INDEX_URL}/{tag}")
}
