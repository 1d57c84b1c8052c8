//! Keelson Monorepo - the root project of a Yarn workspaces monorepo
//!
//! Owns the workspace graph, the build task composer and the release
//! orchestrator, and writes every generated file in one synthesis pass.
//! Dependency installs are deferred until all manifests are on disk.

mod from_config;
pub mod manifest;
mod project;
mod synth;

pub use from_config::from_config;
pub use project::{Monorepo, MonorepoOptions};
pub use synth::{SynthFile, SynthPlan, SynthReport};
