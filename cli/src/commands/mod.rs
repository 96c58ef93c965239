pub mod convert;
pub mod diff;

use anyhow::{anyhow, Context, Result};
use sdkify::{ConversionRequest, ProjectLanguage, PACKAGES_CONFIG_FILE};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Load one project file (and its `packages.config` sidecar, when present)
/// into a conversion request.
pub fn load_request(path: &Path) -> Result<ConversionRequest> {
    let language = ProjectLanguage::from_project_path(path)
        .ok_or_else(|| anyhow!("unrecognized project extension: '{}'", path.display()))?;

    let xml = fs::read_to_string(path)
        .with_context(|| format!("failed to read project file '{}'", path.display()))?;
    let mut descriptor = sdkify::parse_descriptor(&xml)
        .with_context(|| format!("failed to parse project file '{}'", path.display()))?;

    let sidecar = path
        .parent()
        .map(|dir| dir.join(PACKAGES_CONFIG_FILE))
        .filter(|p| p.is_file());
    if let Some(sidecar) = sidecar {
        let xml = fs::read_to_string(&sidecar)
            .with_context(|| format!("failed to read '{}'", sidecar.display()))?;
        descriptor.legacy_package_refs = sdkify::parse_packages_config(&xml)
            .with_context(|| format!("failed to parse '{}'", sidecar.display()))?;
    }

    Ok(ConversionRequest {
        name: path.display().to_string(),
        language,
        descriptor: Arc::new(descriptor),
    })
}
