//! Per-package release pipeline
//!
//! Every package gets a `gather-versions` task that pins its sibling
//! ranges, plus `bump` and `unbump` tasks the root release task fans out
//! to. Private packages only get the gather steps.

use indexmap::IndexMap;
use keelson_adapters::npm::gather::RESET_ENV;
use keelson_adapters::npm::MANIFEST_FILE;
use keelson_core::config::ReleaseOptions;
use keelson_core::error::Result;
use keelson_core::monorepo::{ReleaseConfig, WorkspacePackage};
use keelson_core::types::DependencyKind;
use keelson_core::version_ref::VersionReferencePolicy;
use keelson_tasks::{Task, TaskSet, TaskStep};
use tracing::debug;

use crate::names::ARTIFACTS_DIR;

/// Task that pins sibling dependency ranges
pub const GATHER_TASK: &str = "gather-versions";
/// Task that computes the next version
pub const BUMP_TASK: &str = "bump";
/// Task that restores the development version
pub const UNBUMP_TASK: &str = "unbump";
/// Builtin behind the `bump` task
pub const BUMP_BUILTIN: &str = "bump";
/// Builtin behind the `unbump` task
pub const UNBUMP_BUILTIN: &str = "unbump";

/// Where a package is in the release wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Private package: bump/unbump exist only as containers
    NotReleased,
    /// Tasks are in place, publish jobs not yet rendered
    PipelineBuilt,
    /// Publish jobs are part of the release workflow
    MergedIntoWorkflow,
}

/// Release wiring of one package
#[derive(Debug, Clone)]
pub struct ReleasePipeline {
    package: String,
    directory: String,
    private: bool,
    release: ReleaseConfig,
    gather: IndexMap<String, VersionReferencePolicy>,
    state: PipelineState,
}

impl ReleasePipeline {
    /// Build the pipeline of `package`.
    ///
    /// Fails when the package's release options cannot be combined.
    pub fn new(package: &WorkspacePackage) -> Result<Self> {
        Self::with_monorepo(package, &ReleaseOptions::default())
    }

    /// Build the pipeline of `package` under monorepo-wide release options.
    ///
    /// Unset package options inherit the monorepo defaults. Fails when the
    /// package's major version options clash with the monorepo's.
    pub fn with_monorepo(package: &WorkspacePackage, monorepo: &ReleaseOptions) -> Result<Self> {
        let release = package.release_config().inherit(monorepo);
        release.validate_against(&package.name, monorepo)?;

        Ok(Self {
            package: package.name.clone(),
            directory: package.directory.clone(),
            private: package.private,
            release,
            gather: gather_request(package),
            state: PipelineState::NotReleased,
        })
    }

    /// Package name
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Package directory relative to the root
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Release settings
    pub fn release(&self) -> &ReleaseConfig {
        &self.release
    }

    /// Whether the package is versioned and published
    pub fn is_released(&self) -> bool {
        !self.private
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Dependencies pinned by `gather-versions`, with their policies
    pub fn gather_request(&self) -> &IndexMap<String, VersionReferencePolicy> {
        &self.gather
    }

    /// The `gather-versions` command line, `None` without sibling dependencies
    pub fn gather_command(&self) -> Option<String> {
        if self.gather.is_empty() {
            return None;
        }
        let args: Vec<String> = self
            .gather
            .iter()
            .map(|(dep, policy)| format!("{}={}", dep, policy))
            .collect();
        Some(format!("keelson gather-versions {}", args.join(" ")))
    }

    /// Environment of the `bump` task
    pub fn bump_env(&self) -> IndexMap<String, String> {
        let mut env = IndexMap::new();
        env.insert("OUTFILE".to_string(), MANIFEST_FILE.to_string());
        env.insert("CHANGELOG".to_string(), format!("{}/changelog.md", ARTIFACTS_DIR));
        env.insert("BUMPFILE".to_string(), format!("{}/version.txt", ARTIFACTS_DIR));
        env.insert("RELEASETAG".to_string(), format!("{}/releasetag.txt", ARTIFACTS_DIR));
        env.insert("RELEASE_TAG_PREFIX".to_string(), format!("{}@", self.package));

        let release = &self.release;
        if let Some(major) = release.major_version {
            env.insert("MAJOR".to_string(), major.to_string());
        }
        if let Some(min_major) = release.min_major_version {
            env.insert("MIN_MAJOR".to_string(), min_major.to_string());
        }
        if let Some(prerelease) = &release.prerelease {
            env.insert("PRERELEASE".to_string(), prerelease.clone());
        }
        if let Some(command) = &release.next_version_command {
            env.insert("NEXT_VERSION_COMMAND".to_string(), command.clone());
        }
        if let Some(command) = &release.releasable_commits {
            env.insert("RELEASABLE_COMMITS".to_string(), command.clone());
        }
        env
    }

    /// Add the release tasks to the package's task set
    pub fn apply(&mut self, tasks: &mut TaskSet) {
        let mut gather = Task::new(GATHER_TASK)
            .with_description("Set sibling dependency ranges to the versions being released");
        if let Some(command) = self.gather_command() {
            gather = gather.step(TaskStep::exec(command).receive_args());
        }
        tasks.add(gather);

        let mut bump = Task::new(BUMP_TASK);
        let mut unbump = Task::new(UNBUMP_TASK).env(RESET_ENV, "true");

        if self.private {
            bump = bump
                .with_description("Bumps versions of local dependencies")
                .spawn(GATHER_TASK);
            unbump = unbump
                .with_description("Resets versions of local dependencies to 0.0.0")
                .spawn(GATHER_TASK);
        } else {
            bump.description = Some("Bumps version based on latest git tag".to_string());
            bump.env = self.bump_env();
            bump = bump.spawn(GATHER_TASK).builtin(BUMP_BUILTIN);

            unbump = unbump
                .with_description("Restores version to 0.0.0")
                .env("OUTFILE", MANIFEST_FILE)
                .builtin(UNBUMP_BUILTIN)
                .spawn(GATHER_TASK);
            self.state = PipelineState::PipelineBuilt;
        }

        tasks.add(bump);
        tasks.add(unbump);
        debug!(package = %self.package, state = ?self.state, "release tasks added");
    }

    /// Record that the publish jobs are in the workflow
    pub(crate) fn mark_merged(&mut self) {
        if self.state == PipelineState::PipelineBuilt {
            self.state = PipelineState::MergedIntoWorkflow;
        }
    }
}

/// Sibling dependencies to pin: dev siblings as `exact`, overridden by the
/// policy of runtime and peer references
pub fn gather_request(package: &WorkspacePackage) -> IndexMap<String, VersionReferencePolicy> {
    let mut request = IndexMap::new();
    for (reference, kind) in package.workspace_dependencies() {
        if kind == DependencyKind::Dev {
            request
                .entry(reference.name.clone())
                .or_insert(VersionReferencePolicy::Exact);
        }
    }
    for (reference, kind) in package.workspace_dependencies() {
        if kind != DependencyKind::Dev {
            request.insert(reference.name.clone(), reference.policy);
        }
    }
    request
}
