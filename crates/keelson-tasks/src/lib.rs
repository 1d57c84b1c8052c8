//! Keelson Tasks - task model, runtime and build task composition
//!
//! Projects describe their build as named tasks made of `exec`, `spawn`
//! and `builtin` steps. The monorepo root fans its tasks out to every
//! workspace.

pub mod composer;
pub mod runtime;
pub mod task;

pub use composer::{nohoist, workspaces_section, BuildTaskComposer};
pub use runtime::{BuiltinRunner, NoBuiltins, TaskRuntime};
pub use task::{StepAction, Task, TaskSet, TaskStep};
