//! Post-install pinning of `*` ranges
//!
//! Dependencies declared without a range are written as `*`. Once the root
//! install has run, each `*` is replaced by a caret range on the version that
//! was actually installed.

use std::path::{Path, PathBuf};

use keelson_core::error::Result;
use keelson_core::types::DependencyKind;
use tracing::{debug, warn};

use super::manifest::{manifest_path, PackageJson};
use super::resolve::installed_version;

/// Pins `*` ranges of one package's manifest
#[derive(Debug, Clone)]
pub struct WildcardResolver {
    package_dir: PathBuf,
}

impl WildcardResolver {
    /// Resolver for the package in `package_dir`
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
        }
    }

    /// Package directory this resolver works on
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Rewrite every `*` range whose dependency is installed.
    ///
    /// Returns `true` when the manifest was rewritten. Dependencies that
    /// cannot be resolved keep their `*`.
    pub fn resolve_and_write(&self) -> Result<bool> {
        let path = manifest_path(&self.package_dir);
        let mut manifest = PackageJson::load(&path)?;
        let mut changed = false;

        for kind in DependencyKind::ALL {
            for name in manifest.wildcard_dependencies(kind) {
                match installed_version(&name, &self.package_dir) {
                    Ok(version) => {
                        let range = format!("^{}", version);
                        debug!(dependency = %name, %range, kind = %kind, "pinned wildcard range");
                        manifest.replace_range(kind, &name, &range);
                        changed = true;
                    }
                    Err(e) => warn!(dependency = %name, error = %e, "leaving wildcard range unresolved"),
                }
            }
        }

        if changed {
            manifest.save(&path)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_pins_installed_wildcards() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("node_modules/lodash/package.json"),
            r#"{"name": "lodash", "version": "4.17.21"}"#,
        );
        let dir = temp.path().join("packages/one");
        write(
            &dir.join("package.json"),
            r#"{"name": "one", "dependencies": {"lodash": "*", "missing": "*", "fixed": "^1.0.0"}}"#,
        );

        let resolver = WildcardResolver::new(&dir);
        assert!(resolver.resolve_and_write().unwrap());

        let manifest = PackageJson::load_from_dir(&dir).unwrap();
        assert_eq!(manifest.range(DependencyKind::Runtime, "lodash"), Some("^4.17.21"));
        assert_eq!(manifest.range(DependencyKind::Runtime, "missing"), Some("*"));
        assert_eq!(manifest.range(DependencyKind::Runtime, "fixed"), Some("^1.0.0"));

        // Nothing left to pin.
        assert!(!resolver.resolve_and_write().unwrap());
    }
}
