//! GitHub integration: the workflow model written to `.github/workflows`

pub mod workflow;

pub use workflow::{
    Container, CronSchedule, Empty, Job, PushTrigger, Step, Triggers, Workflow, GENERATED_HEADER,
};

/// Directory workflow files are written to, relative to the root
pub const WORKFLOWS_DIR: &str = ".github/workflows";
