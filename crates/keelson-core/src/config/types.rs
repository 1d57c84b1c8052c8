//! Configuration types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::PackageManager;
use crate::version_ref::VersionReferencePolicy;

/// Main configuration for a Keelson monorepo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Name of the root package
    pub name: String,

    /// Root package description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Repository URL written into every manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Branch releases are cut from
    pub default_release_branch: String,

    /// Package manager driving the workspace
    pub package_manager: PackageManager,

    /// Whether GitHub integration (workflow files) is enabled
    pub github: bool,

    /// Development dependencies of the root package
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dev_deps: Vec<String>,

    /// Release configuration
    pub release: ReleaseOptions,

    /// Workspace packages, in registration order
    pub packages: Vec<PackageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            name: "monorepo".to_string(),
            description: None,
            repository: None,
            default_release_branch: "main".to_string(),
            package_manager: PackageManager::default(),
            github: true,
            dev_deps: Vec::new(),
            release: ReleaseOptions::default(),
            packages: Vec::new(),
        }
    }
}

/// How releases are triggered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseTrigger {
    /// Release on every push to the release branch
    #[default]
    Continuous,
    /// Release on the cron schedule in `release.schedule`
    Scheduled,
    /// Release by hand from a developer machine
    Manual,
}

impl std::fmt::Display for ReleaseTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continuous => write!(f, "continuous"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Monorepo-wide release options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseOptions {
    /// Whether the release workflow is generated
    pub enabled: bool,

    /// Release trigger
    pub trigger: ReleaseTrigger,

    /// Cron expression for scheduled releases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// Workflow name override (defaults to `release` or `release-<branch>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,

    /// Pin every package to this major version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_version: Option<u64>,

    /// Floor for the major version of every package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_major_version: Option<u64>,

    /// npm dist-tag for packages that do not set their own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm_dist_tag: Option<String>,

    /// Prerelease identifier for packages that do not set their own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<String>,

    /// Whether packages publish to npm unless they say otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_to_npm: Option<bool>,

    /// Runner labels for every job
    pub runs_on: Vec<String>,

    /// Container image the release job runs in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_container_image: Option<String>,

    /// Node version installed in CI
    pub node_version: String,

    /// Registry host for npm publishing
    pub npm_registry: String,

    /// Extra shell commands run before the release task
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub setup_steps: Vec<String>,

    /// Extra shell commands run after the release task
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_build_steps: Vec<String>,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger: ReleaseTrigger::default(),
            schedule: None,
            workflow_name: None,
            major_version: None,
            min_major_version: None,
            npm_dist_tag: None,
            prerelease: None,
            publish_to_npm: None,
            runs_on: vec!["ubuntu-latest".to_string()],
            workflow_container_image: None,
            node_version: "lts/*".to_string(),
            npm_registry: "registry.npmjs.org".to_string(),
            setup_steps: Vec::new(),
            post_build_steps: Vec::new(),
        }
    }
}

/// A dependency as written in the config file
///
/// Either a bare `name[@range]` or a record carrying a reference policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// `name` or `name@range`
    Name(String),
    /// Dependency with an explicit reference policy
    Detailed {
        /// Package name
        name: String,
        /// Reference policy applied at release time
        #[serde(default)]
        policy: Option<VersionReferencePolicy>,
    },
}

impl DependencySpec {
    /// The full spec text (`name` or `name@range`)
    pub fn spec(&self) -> &str {
        match self {
            Self::Name(s) => s,
            Self::Detailed { name, .. } => name,
        }
    }

    /// The package name, with any version range stripped
    pub fn name(&self) -> &str {
        split_spec(self.spec()).0
    }

    /// Explicit reference policy, if any
    pub fn policy(&self) -> Option<VersionReferencePolicy> {
        match self {
            Self::Name(_) => None,
            Self::Detailed { policy, .. } => *policy,
        }
    }
}

/// Split `name@range` into name and optional range.
///
/// Scoped names (`@scope/pkg@1.0.0`) keep their leading `@`.
pub fn split_spec(spec: &str) -> (&str, Option<&str>) {
    let search_from = usize::from(spec.starts_with('@'));
    match spec[search_from..].find('@') {
        Some(idx) => {
            let at = idx + search_from;
            (&spec[..at], Some(&spec[at + 1..]))
        }
        None => (spec, None),
    }
}

/// Configuration for a single workspace package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Package name
    pub name: String,

    /// Package description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Directory relative to the root (defaults to `<scope>/<name>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Workspace scope directory (defaults to `packages`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Private packages are never published
    pub private: bool,

    /// Allow runtime dependencies on private siblings (they get bundled)
    pub allow_private_deps: bool,

    /// Runtime dependencies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<DependencySpec>,

    /// Peer dependencies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub peer_deps: Vec<DependencySpec>,

    /// Development dependencies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dev_deps: Vec<DependencySpec>,

    /// External dependencies bundled into the package
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bundled_deps: Vec<String>,

    /// Per-package release settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<PackageReleaseConfig>,

    /// Extra fields merged into the generated package.json
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub manifest: BTreeMap<String, serde_json::Value>,
}

/// Per-package release settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageReleaseConfig {
    /// npm dist-tag to publish under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm_dist_tag: Option<String>,

    /// Prerelease identifier (e.g. `beta`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<String>,

    /// Pin the package to this major version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_version: Option<u64>,

    /// Floor for the package's major version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_major_version: Option<u64>,

    /// Command printing the next version, overriding commit analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_version_command: Option<String>,

    /// Command listing commits that count towards a release
    #[serde(skip_serializing_if = "Option::is_none")]
    pub releasable_commits: Option<String>,

    /// Publish to npm (defaults to true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_to_npm: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_spec() {
        assert_eq!(split_spec("lodash"), ("lodash", None));
        assert_eq!(split_spec("lodash@^4"), ("lodash", Some("^4")));
        assert_eq!(split_spec("@cdklabs/one"), ("@cdklabs/one", None));
        assert_eq!(
            split_spec("@cdklabs/one@1.2.3"),
            ("@cdklabs/one", Some("1.2.3"))
        );
    }

    #[test]
    fn test_dependency_spec_forms() {
        let yaml = r#"
- lodash@^4
- name: two
  policy: exact
- name: three
"#;
        let specs: Vec<DependencySpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(specs[0].name(), "lodash");
        assert_eq!(specs[0].spec(), "lodash@^4");
        assert_eq!(specs[0].policy(), None);
        assert_eq!(specs[1].name(), "two");
        assert_eq!(specs[1].policy(), Some(VersionReferencePolicy::Exact));
        assert_eq!(specs[2].policy(), None);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_release_branch, "main");
        assert!(config.github);
        assert!(!config.release.enabled);
        assert_eq!(config.release.runs_on, vec!["ubuntu-latest"]);
    }
}
