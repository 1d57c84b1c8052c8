//! Workspace package model

use serde::{Deserialize, Serialize};

use crate::config::{split_spec, PackageReleaseConfig, ReleaseOptions, DEFAULT_SCOPE};
use crate::error::ConfigError;
use crate::types::DependencyKind;
use crate::version_ref::VersionReferencePolicy;

/// Everything a consumer needs to know to depend on a workspace package.
///
/// Graph edges are resolved by `name`, so a reference can be built by hand
/// for a package that registers later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceReference {
    /// Package name
    pub name: String,
    /// Directory relative to the monorepo root
    pub directory: String,
    /// Whether the referenced package is private
    pub private: bool,
    /// Range policy applied at release time
    pub policy: VersionReferencePolicy,
}

impl WorkspaceReference {
    /// Create a reference with the default policy
    pub fn new(name: impl Into<String>, directory: impl Into<String>, private: bool) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            private,
            policy: VersionReferencePolicy::default(),
        }
    }

    /// The same reference with a different policy
    pub fn with_policy(mut self, policy: VersionReferencePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// What a dependency points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DependencyTarget {
    /// A sibling package in the same monorepo
    Workspace(WorkspaceReference),
    /// A package from the registry
    External {
        /// Package name
        name: String,
        /// Declared range, if any
        range: Option<String>,
    },
}

/// A single dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Dependency target
    pub target: DependencyTarget,
    /// Dependency kind
    pub kind: DependencyKind,
}

impl Dependency {
    /// Dependency on a sibling package
    pub fn workspace(reference: WorkspaceReference, kind: DependencyKind) -> Self {
        Self {
            target: DependencyTarget::Workspace(reference),
            kind,
        }
    }

    /// Dependency on a registry package, `name` or `name@range`
    pub fn external(spec: &str, kind: DependencyKind) -> Self {
        let (name, range) = split_spec(spec);
        Self {
            target: DependencyTarget::External {
                name: name.to_string(),
                range: range.map(str::to_string),
            },
            kind,
        }
    }

    /// Name of the dependency
    pub fn name(&self) -> &str {
        match &self.target {
            DependencyTarget::Workspace(reference) => &reference.name,
            DependencyTarget::External { name, .. } => name,
        }
    }

    /// The workspace reference, if this is a sibling dependency
    pub fn as_workspace(&self) -> Option<&WorkspaceReference> {
        match &self.target {
            DependencyTarget::Workspace(reference) => Some(reference),
            DependencyTarget::External { .. } => None,
        }
    }

    /// Whether the dependency points at a sibling package
    pub fn is_workspace(&self) -> bool {
        self.as_workspace().is_some()
    }
}

/// Release settings of a single package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// npm dist-tag
    pub npm_dist_tag: Option<String>,
    /// Prerelease identifier
    pub prerelease: Option<String>,
    /// Pinned major version
    pub major_version: Option<u64>,
    /// Major version floor
    pub min_major_version: Option<u64>,
    /// Next version override command
    pub next_version_command: Option<String>,
    /// Releasable commits command
    pub releasable_commits: Option<String>,
    /// Whether the package is published to npm (unset means yes)
    pub publish_to_npm: Option<bool>,
}

impl ReleaseConfig {
    /// Reject settings that cannot be combined
    pub fn validate(&self, package: &str) -> Result<(), ConfigError> {
        if self.major_version.is_some() && self.min_major_version.is_some() {
            return Err(mutually_exclusive_majors(package));
        }
        Ok(())
    }

    /// Reject major version settings that clash with the monorepo-wide ones.
    ///
    /// The root release task exports the monorepo `MAJOR`/`MIN_MAJOR` to
    /// every package bump, so a package may only repeat the same kind.
    pub fn validate_against(&self, package: &str, monorepo: &ReleaseOptions) -> Result<(), ConfigError> {
        self.validate(package)?;
        let clash = (monorepo.major_version.is_some() && self.min_major_version.is_some())
            || (monorepo.min_major_version.is_some() && self.major_version.is_some());
        if clash {
            return Err(mutually_exclusive_majors(package));
        }
        Ok(())
    }

    /// Fill unset fields from the monorepo-wide defaults
    pub fn inherit(mut self, monorepo: &ReleaseOptions) -> Self {
        if self.npm_dist_tag.is_none() {
            self.npm_dist_tag = monorepo.npm_dist_tag.clone();
        }
        if self.prerelease.is_none() {
            self.prerelease = monorepo.prerelease.clone();
        }
        if self.publish_to_npm.is_none() {
            self.publish_to_npm = monorepo.publish_to_npm;
        }
        self
    }

    /// Whether the package is published to npm
    pub fn publishes_to_npm(&self) -> bool {
        self.publish_to_npm.unwrap_or(true)
    }
}

fn mutually_exclusive_majors(package: &str) -> ConfigError {
    ConfigError::MutuallyExclusiveOption {
        package: package.to_string(),
        first: "minMajorVersion".to_string(),
        second: "majorVersion".to_string(),
    }
}

impl From<PackageReleaseConfig> for ReleaseConfig {
    fn from(config: PackageReleaseConfig) -> Self {
        Self {
            npm_dist_tag: config.npm_dist_tag,
            prerelease: config.prerelease,
            major_version: config.major_version,
            min_major_version: config.min_major_version,
            next_version_command: config.next_version_command,
            releasable_commits: config.releasable_commits,
            publish_to_npm: config.publish_to_npm,
        }
    }
}

/// A package living in the monorepo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspacePackage {
    /// Package name, unique in the graph
    pub name: String,
    /// Directory relative to the root, unique in the graph
    pub directory: String,
    /// Private packages are never published
    pub private: bool,
    /// Package description
    pub description: Option<String>,
    /// Dependencies in declaration order
    pub dependencies: Vec<Dependency>,
    /// External dependencies bundled into the package (`name[@range]`)
    pub bundled_dependencies: Vec<String>,
    /// Whether runtime dependencies on private siblings are allowed
    pub allow_private_deps: bool,
    /// Release settings
    pub release: Option<ReleaseConfig>,
    /// Extra fields merged into the rendered manifest
    pub manifest_overrides: serde_json::Map<String, serde_json::Value>,
}

impl WorkspacePackage {
    /// Create a public package in `packages/<name>`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            directory: format!("{}/{}", DEFAULT_SCOPE, name),
            name,
            private: false,
            description: None,
            dependencies: Vec::new(),
            bundled_dependencies: Vec::new(),
            allow_private_deps: false,
            release: None,
            manifest_overrides: serde_json::Map::new(),
        }
    }

    /// Set the directory
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Mark the package private
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a dependency on a sibling package
    pub fn depends_on(mut self, reference: WorkspaceReference, kind: DependencyKind) -> Self {
        self.dependencies.push(Dependency::workspace(reference, kind));
        self
    }

    /// Add a dependency on a registry package
    pub fn depends_on_external(mut self, spec: &str, kind: DependencyKind) -> Self {
        self.dependencies.push(Dependency::external(spec, kind));
        self
    }

    /// Add a bundled registry dependency
    pub fn bundles(mut self, spec: impl Into<String>) -> Self {
        self.bundled_dependencies.push(spec.into());
        self
    }

    /// Allow runtime dependencies on private siblings
    pub fn allow_private_deps(mut self) -> Self {
        self.allow_private_deps = true;
        self
    }

    /// Set release settings
    pub fn with_release(mut self, release: ReleaseConfig) -> Self {
        self.release = Some(release);
        self
    }

    /// Reference to this package with the default policy
    pub fn reference(&self) -> WorkspaceReference {
        WorkspaceReference::new(&self.name, &self.directory, self.private)
    }

    /// Release settings, falling back to defaults
    pub fn release_config(&self) -> ReleaseConfig {
        self.release.clone().unwrap_or_default()
    }

    /// Sibling dependencies, in declaration order
    pub fn workspace_dependencies(&self) -> impl Iterator<Item = (&WorkspaceReference, DependencyKind)> {
        self.dependencies
            .iter()
            .filter_map(|d| d.as_workspace().map(|r| (r, d.kind)))
    }

    /// Bundled dependency names, version suffix stripped
    pub fn bundled_names(&self) -> impl Iterator<Item = &str> {
        self.bundled_dependencies.iter().map(|spec| split_spec(spec).0)
    }

    /// Check the public/private dependency rules.
    ///
    /// A public package may depend on a private sibling only as a dev
    /// dependency, or as a runtime dependency when `allow_private_deps` is
    /// set. Private peer dependencies are always rejected.
    pub fn check_private_dependencies(&self) -> Result<(), ConfigError> {
        if self.private {
            return Ok(());
        }
        for (reference, kind) in self.workspace_dependencies() {
            if !reference.private {
                continue;
            }
            let allowed = match kind {
                DependencyKind::Dev => true,
                DependencyKind::Runtime => self.allow_private_deps,
                DependencyKind::Peer => false,
            };
            if !allowed {
                return Err(ConfigError::PrivateDependency {
                    package: self.name.clone(),
                    dependency: reference.name.clone(),
                    kind: kind.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_from_package() {
        let pkg = WorkspacePackage::new("one").private();
        let reference = pkg.reference();
        assert_eq!(reference.name, "one");
        assert_eq!(reference.directory, "packages/one");
        assert!(reference.private);
        assert_eq!(reference.policy, VersionReferencePolicy::FutureMinor);

        let exact = reference.with_policy(VersionReferencePolicy::Exact);
        assert_eq!(exact.policy, VersionReferencePolicy::Exact);
    }

    #[test]
    fn test_external_dependency_range() {
        let dep = Dependency::external("@types/node@^18", DependencyKind::Dev);
        assert_eq!(dep.name(), "@types/node");
        assert!(!dep.is_workspace());
        assert!(matches!(
            dep.target,
            DependencyTarget::External { range: Some(ref r), .. } if r == "^18"
        ));
    }

    #[test]
    fn test_public_private_runtime_needs_opt_in() {
        let private = WorkspacePackage::new("priv").private();
        let consumer = WorkspacePackage::new("pub").depends_on(private.reference(), DependencyKind::Runtime);
        let err = consumer.check_private_dependencies().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("cannot depend on any private packages"));
        assert!(message.contains("pub"));
        assert!(message.contains("priv"));

        let bundling = consumer.allow_private_deps();
        assert!(bundling.check_private_dependencies().is_ok());
    }

    #[test]
    fn test_private_peer_always_rejected() {
        let private = WorkspacePackage::new("priv").private();
        let consumer = WorkspacePackage::new("pub")
            .allow_private_deps()
            .depends_on(private.reference(), DependencyKind::Peer);
        assert!(consumer.check_private_dependencies().is_err());
    }

    #[test]
    fn test_private_dev_and_private_consumer_allowed() {
        let private = WorkspacePackage::new("priv").private();
        let dev = WorkspacePackage::new("pub").depends_on(private.reference(), DependencyKind::Dev);
        assert!(dev.check_private_dependencies().is_ok());

        let private_consumer = WorkspacePackage::new("other")
            .private()
            .depends_on(private.reference(), DependencyKind::Peer);
        assert!(private_consumer.check_private_dependencies().is_ok());
    }

    #[test]
    fn test_release_mutual_exclusion() {
        let release = ReleaseConfig {
            major_version: Some(2),
            min_major_version: Some(1),
            ..Default::default()
        };
        let err = release.validate("one").unwrap_err();
        assert!(err
            .to_string()
            .contains("minMajorVersion and majorVersion cannot be used together"));
    }

    #[test]
    fn test_release_majors_against_monorepo() {
        let monorepo = ReleaseOptions {
            major_version: Some(2),
            ..Default::default()
        };
        let floor = ReleaseConfig {
            min_major_version: Some(1),
            ..Default::default()
        };
        let err = floor.validate_against("one", &monorepo).unwrap_err();
        assert_eq!(err.to_string(), "one: minMajorVersion and majorVersion cannot be used together");

        let pinned = ReleaseConfig {
            major_version: Some(3),
            ..Default::default()
        };
        assert!(pinned.validate_against("one", &monorepo).is_ok());

        let monorepo = ReleaseOptions {
            min_major_version: Some(1),
            ..Default::default()
        };
        assert!(pinned.validate_against("one", &monorepo).is_err());
    }

    #[test]
    fn test_release_inherits_monorepo_defaults() {
        let monorepo = ReleaseOptions {
            npm_dist_tag: Some("next".to_string()),
            prerelease: Some("beta".to_string()),
            publish_to_npm: Some(false),
            ..Default::default()
        };
        let inherited = ReleaseConfig::default().inherit(&monorepo);
        assert_eq!(inherited.npm_dist_tag.as_deref(), Some("next"));
        assert_eq!(inherited.prerelease.as_deref(), Some("beta"));
        assert!(!inherited.publishes_to_npm());

        let own = ReleaseConfig {
            npm_dist_tag: Some("latest".to_string()),
            publish_to_npm: Some(true),
            ..Default::default()
        }
        .inherit(&monorepo);
        assert_eq!(own.npm_dist_tag.as_deref(), Some("latest"));
        assert!(own.publishes_to_npm());
        assert!(ReleaseConfig::default().publishes_to_npm());
    }

    #[test]
    fn test_bundled_names_strip_version() {
        let pkg = WorkspacePackage::new("one").bundles("dep-a@^1").bundles("@scope/dep-b");
        let names: Vec<_> = pkg.bundled_names().collect();
        assert_eq!(names, vec!["dep-a", "@scope/dep-b"]);
    }
}
