//! The `gather-versions` rewrite
//!
//! Run inside a package directory at release time. Each `DEP=POLICY`
//! argument pins the package's declared range on `DEP` to the version that
//! is actually installed, shaped by `POLICY`. Dev dependencies always get the
//! exact version that was used for the build.

use std::path::Path;

use indexmap::IndexMap;
use keelson_core::error::{AdapterError, Result};
use keelson_core::types::DependencyKind;
use keelson_core::version_ref::{self, VersionReferencePolicy};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::manifest::{manifest_path, PackageJson};
use super::resolve::installed_version;

/// Environment variable that turns the rewrite into a reset
pub const RESET_ENV: &str = "RESET_VERSIONS";

/// Usage text printed for `--help` and on malformed arguments
pub const USAGE: &str = "Usage: keelson gather-versions PKG=POLICY [PKG=POLICY] [...]

Positionals:
  PKG\tPackage name.
  POLICY\tany-minor | future-minor | any-patch | future-patch | exact | any-future | any
";

/// One `DEP=POLICY` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherRequest {
    /// Dependency name
    pub dependency: String,
    /// Reference policy for runtime and peer sections
    pub policy: VersionReferencePolicy,
}

/// Whether the reset toggle is set in the environment
pub fn reset_requested() -> bool {
    std::env::var(RESET_ENV).is_ok_and(|v| v == "true" || v == "1")
}

/// Parse `DEP=POLICY` arguments.
///
/// A dependency named twice keeps its first position and its last policy.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<GatherRequest>> {
    if args.is_empty() {
        return Err(AdapterError::InvalidArguments("expected at least one PKG=POLICY argument".to_string()).into());
    }

    let mut requests: IndexMap<String, VersionReferencePolicy> = IndexMap::new();
    for arg in args {
        let arg = arg.as_ref();
        let (dependency, policy) = arg
            .split_once('=')
            .ok_or_else(|| AdapterError::InvalidArguments(format!("'{}' is not of the form PKG=POLICY", arg)))?;
        if dependency.is_empty() {
            return Err(AdapterError::InvalidArguments(format!("'{}' has an empty package name", arg)).into());
        }
        let policy: VersionReferencePolicy = policy
            .parse()
            .map_err(|e: keelson_core::error::VersionError| AdapterError::InvalidArguments(e.to_string()))?;
        requests.insert(dependency.to_string(), policy);
    }

    Ok(requests
        .into_iter()
        .map(|(dependency, policy)| GatherRequest { dependency, policy })
        .collect())
}

/// What the rewrite did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatherReport {
    /// Package name
    pub name: Option<String>,
    /// Package version
    pub version: Option<String>,
    /// New ranges by section, only for sections that were touched
    pub updated: IndexMap<&'static str, IndexMap<String, String>>,
}

impl GatherReport {
    /// Render as a JSON object (`name`, `version`, then touched sections)
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(version) = &self.version {
            map.insert("version".to_string(), Value::String(version.clone()));
        }
        for (section, entries) in &self.updated {
            let entries: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert(section.to_string(), Value::Object(entries));
        }
        Value::Object(map)
    }

    /// Total number of rewritten entries
    pub fn count(&self) -> usize {
        self.updated.values().map(IndexMap::len).sum()
    }
}

/// Rewrite `<package_dir>/package.json` for `requests`.
///
/// With `reset`, every listed dependency is set to the placeholder range in
/// every section where it appears; policies are ignored and nothing is
/// looked up in `node_modules`.
pub fn gather_versions(package_dir: &Path, requests: &[GatherRequest], reset: bool) -> Result<GatherReport> {
    let path = manifest_path(package_dir);
    let mut manifest = PackageJson::load(&path)?;

    let mut report = GatherReport {
        name: manifest.name().map(str::to_string),
        version: manifest.version().map(str::to_string),
        updated: IndexMap::new(),
    };

    for request in requests {
        let (runtime_range, dev_range) = if reset {
            (version_ref::reset().to_string(), version_ref::reset().to_string())
        } else {
            let version = installed_version(&request.dependency, package_dir)?;
            debug!(dependency = %request.dependency, %version, policy = %request.policy, "resolved installed version");
            (request.policy.resolve(&version)?, version)
        };

        for kind in DependencyKind::ALL {
            let range = match kind {
                DependencyKind::Dev => &dev_range,
                DependencyKind::Runtime | DependencyKind::Peer => &runtime_range,
            };
            if manifest.replace_range(kind, &request.dependency, range) {
                report
                    .updated
                    .entry(kind.manifest_section())
                    .or_default()
                    .insert(request.dependency.clone(), range.clone());
            }
        }
    }

    manifest.save(&path)?;
    info!(
        package = report.name.as_deref().unwrap_or("?"),
        updated = report.count(),
        reset,
        "gathered dependency versions"
    );
    Ok(report)
}
