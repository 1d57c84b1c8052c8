//! GitHub Actions workflow model
//!
//! Only what generated workflows need: triggers, jobs with `needs`/`if`
//! wiring, outputs, permissions and steps. Key order is preserved.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Header written at the top of every generated workflow
pub const GENERATED_HEADER: &str =
    "# ~~ Generated by keelson. To modify, edit the keelson config and run \"keelson synth\".\n\n";

/// A workflow file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow name
    pub name: String,
    /// Triggers
    pub on: Triggers,
    /// Workflow-level environment
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    /// Jobs by id, in insertion order
    pub jobs: IndexMap<String, Job>,
}

impl Workflow {
    /// Create an empty workflow
    pub fn new(name: impl Into<String>, on: Triggers) -> Self {
        Self {
            name: name.into(),
            on,
            env: IndexMap::new(),
            jobs: IndexMap::new(),
        }
    }

    /// Add or replace a job
    pub fn add_job(&mut self, id: impl Into<String>, job: Job) {
        self.jobs.insert(id.into(), job);
    }

    /// Look up a job
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Render as YAML with the generated-file header
    pub fn to_yaml(&self) -> Result<String> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!("{}{}", GENERATED_HEADER, body))
    }
}

/// Workflow triggers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggers {
    /// Push trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<PushTrigger>,
    /// Manual dispatch trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_dispatch: Option<Empty>,
    /// Cron schedules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<CronSchedule>,
}

impl Triggers {
    /// Push to `branch` plus manual dispatch
    pub fn push_and_dispatch(branch: impl Into<String>) -> Self {
        Self {
            push: Some(PushTrigger {
                branches: vec![branch.into()],
            }),
            workflow_dispatch: Some(Empty {}),
            schedule: Vec::new(),
        }
    }

    /// Run on `cron` plus manual dispatch
    pub fn schedule_and_dispatch(cron: impl Into<String>) -> Self {
        Self {
            push: None,
            workflow_dispatch: Some(Empty {}),
            schedule: vec![CronSchedule { cron: cron.into() }],
        }
    }
}

/// One `schedule` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronSchedule {
    /// Cron expression
    pub cron: String,
}

/// Container a job runs in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Image reference
    pub image: String,
}

/// Push trigger filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushTrigger {
    /// Branches that trigger the workflow
    pub branches: Vec<String>,
}

/// Renders as `{}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

/// A job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Runner labels
    pub runs_on: Vec<String>,
    /// Container the steps run in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    /// Jobs that must finish first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    /// Condition expression
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Token permissions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub permissions: IndexMap<String, String>,
    /// Job outputs
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, String>,
    /// Job-level environment
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    /// Steps in order
    pub steps: Vec<Step>,
}

impl Job {
    /// Create a job running on `runs_on`
    pub fn new(runs_on: Vec<String>) -> Self {
        Self {
            runs_on,
            ..Default::default()
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run the steps inside `image`
    pub fn in_container(mut self, image: impl Into<String>) -> Self {
        self.container = Some(Container { image: image.into() });
        self
    }

    /// Add a `needs` edge
    pub fn needs(mut self, job: impl Into<String>) -> Self {
        self.needs.push(job.into());
        self
    }

    /// Set the condition expression
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Add a permission
    pub fn permission(mut self, scope: impl Into<String>, level: impl Into<String>) -> Self {
        self.permissions.insert(scope.into(), level.into());
        self
    }

    /// Add an output
    pub fn output(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), value.into());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Append a step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Find a step by id
    pub fn find_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id.as_deref() == Some(id))
    }
}

/// A job step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Step id, used to reference outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Condition expression
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Keep the job going if this step fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
    /// Directory the command runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Action reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    /// Action inputs
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub with: IndexMap<String, Value>,
    /// Step environment
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    /// Shell command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

impl Step {
    /// A step running a shell command
    pub fn run(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            run: Some(command.into()),
            ..Default::default()
        }
    }

    /// A step using an action
    pub fn uses(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            uses: Some(action.into()),
            ..Default::default()
        }
    }

    /// Set the step id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the condition expression
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Tolerate failure of this step
    pub fn continue_on_error(mut self) -> Self {
        self.continue_on_error = Some(true);
        self
    }

    /// Run in `dir`
    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Add an action input
    pub fn input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with.insert(key.into(), value.into());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }
}
