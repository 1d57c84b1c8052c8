//! Node-style manifest resolution through `node_modules`

use std::path::{Path, PathBuf};

use keelson_core::error::{AdapterError, Result};
use tracing::trace;

use super::manifest::{PackageJson, MANIFEST_FILE};

/// Find `<dependency>/package.json` the way Node's `require.resolve` does:
/// look in `node_modules` of `from` and then of every ancestor.
pub fn resolve_manifest(dependency: &str, from: &Path) -> Result<PathBuf> {
    for dir in from.ancestors() {
        if dir.file_name().is_some_and(|name| name == "node_modules") {
            continue;
        }
        let candidate = dir.join("node_modules").join(dependency).join(MANIFEST_FILE);
        trace!(candidate = %candidate.display(), "probing");
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(AdapterError::DependencyNotResolved {
        dependency: dependency.to_string(),
        from: from.to_path_buf(),
    }
    .into())
}

/// Installed version of `dependency` as seen from `from`
pub fn installed_version(dependency: &str, from: &Path) -> Result<String> {
    let path = resolve_manifest(dependency, from)?;
    let manifest = PackageJson::load(&path)?;
    manifest.version().map(str::to_string).ok_or_else(|| {
        AdapterError::ManifestParseError {
            path,
            reason: "missing \"version\"".to_string(),
        }
        .into()
    })
}
