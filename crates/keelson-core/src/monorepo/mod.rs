//! Monorepo model
//!
//! - Workspace packages and the references between them
//! - The dependency graph with topological ordering and cycle detection
//! - Deferred, batched dependency installation

pub mod graph;
pub mod install;
pub mod package;

pub use graph::WorkspaceGraph;
pub use install::{
    DependencyResolver, FlushOutcome, InstallCoordinator, InstallDelegate, PackageInstaller,
};
pub use package::{
    Dependency, DependencyTarget, ReleaseConfig, WorkspacePackage, WorkspaceReference,
};
