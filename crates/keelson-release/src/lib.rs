//! Keelson Release - monorepo release orchestration
//!
//! Wires every workspace package into one release: per-package
//! `gather-versions`/`bump`/`unbump` tasks, the root `release` task, and a
//! GitHub workflow with per-package npm and GitHub Releases jobs.

pub mod builtins;
pub mod bump;
pub mod names;
pub mod orchestrator;
pub mod pipeline;
pub mod publisher;

pub use builtins::ReleaseBuiltins;
pub use bump::{BumpKind, BumpOptions, BumpOutcome};
pub use orchestrator::{GeneratedWorkflow, ReleaseOrchestrator};
pub use pipeline::{PipelineState, ReleasePipeline};
pub use publisher::PackagePublisher;
