//! Keelson Core - Core library for monorepo configuration
//!
//! This crate provides the foundational types, error handling, configuration,
//! version reference policies, the workspace graph, and the GitHub workflow
//! model shared by every other Keelson crate.

pub mod config;
pub mod error;
pub mod github;
pub mod monorepo;
pub mod types;
pub mod version_ref;

pub use config::Config;
pub use error::{KeelsonError, Result};
pub use monorepo::{
    Dependency, DependencyTarget, InstallCoordinator, InstallDelegate, PackageInstaller,
    ReleaseConfig, WorkspaceGraph, WorkspacePackage, WorkspaceReference,
};
pub use types::{DependencyKind, PackageManager};
pub use version_ref::VersionReferencePolicy;
