//! Task types and definitions
//!
//! A task is a named, ordered list of steps. Task sets serialize to
//! `.keelson/tasks.json` and are executed by the runtime.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use keelson_core::config::TASKS_FILE;
use keelson_core::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    /// Shell command, run with `sh -c`
    Exec(String),
    /// Another task in the same set
    Spawn(String),
    /// Command implemented by the keelson binary itself
    Builtin(String),
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single step of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStep {
    #[serde(flatten)]
    pub action: StepAction,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Working directory relative to the task set root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    /// Extra environment for this step
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Append the arguments passed to the task
    #[serde(default, skip_serializing_if = "is_false")]
    pub receive_args: bool,
}

impl TaskStep {
    fn with_action(action: StepAction) -> Self {
        Self {
            action,
            name: None,
            cwd: None,
            env: IndexMap::new(),
            receive_args: false,
        }
    }

    /// Run a shell command
    pub fn exec(command: impl Into<String>) -> Self {
        Self::with_action(StepAction::Exec(command.into()))
    }

    /// Run another task
    pub fn spawn(task: impl Into<String>) -> Self {
        Self::with_action(StepAction::Spawn(task.into()))
    }

    /// Run a builtin command
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::with_action(StepAction::Builtin(name.into()))
    }

    /// Set the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the working directory
    pub fn in_dir(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Append task arguments to this step
    pub fn receive_args(mut self) -> Self {
        self.receive_args = true;
        self
    }

    /// Short human-readable form of the step
    pub fn describe(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.action {
            StepAction::Exec(command) => command.clone(),
            StepAction::Spawn(task) => format!("spawn {}", task),
            StepAction::Builtin(name) => format!("builtin {}", name),
        }
    }
}

/// A named task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task name
    pub name: String,

    /// Description shown by `keelson run --list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Environment applied to every step
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Steps in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<TaskStep>,
}

impl Task {
    /// Create an empty task
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            env: IndexMap::new(),
            steps: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Append a step
    pub fn step(mut self, step: TaskStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Append an exec step
    pub fn exec(self, command: impl Into<String>) -> Self {
        self.step(TaskStep::exec(command))
    }

    /// Append a spawn step
    pub fn spawn(self, task: impl Into<String>) -> Self {
        self.step(TaskStep::spawn(task))
    }

    /// Append a builtin step
    pub fn builtin(self, name: impl Into<String>) -> Self {
        self.step(TaskStep::builtin(name))
    }

    /// Drop every step, keeping name, description and env
    pub fn reset(&mut self) {
        self.steps.clear();
    }

    /// Names of the tasks this task spawns
    pub fn spawned(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match &step.action {
            StepAction::Spawn(task) => Some(task.as_str()),
            _ => None,
        })
    }
}

/// The tasks of one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSet {
    /// Tasks by name, in definition order
    #[serde(default)]
    pub tasks: IndexMap<String, Task>,

    /// Environment shared by every task
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
}

impl TaskSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a task
    pub fn add(&mut self, task: Task) -> Option<Task> {
        self.tasks.insert(task.name.clone(), task)
    }

    /// Remove a task, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<Task> {
        self.tasks.shift_remove(name)
    }

    /// Look up a task
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Look up a task for modification
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    /// Whether a task exists
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Clear the steps of `name`, creating the task if it is missing
    pub fn reset(&mut self, name: &str) -> &mut Task {
        let task = self
            .tasks
            .entry(name.to_string())
            .or_insert_with(|| Task::new(name));
        task.reset();
        task
    }

    /// Check that every spawn step names a task in the set
    pub fn check_spawn_targets(&self) -> Result<()> {
        for task in self.tasks.values() {
            for target in task.spawned() {
                if !self.contains(target) {
                    return Err(ReleaseError::TaskNotFound(format!(
                        "{} (spawned by {})",
                        target, task.name
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Render as 2-space-indented JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string_pretty(self)?))
    }

    /// Path of the task file under `dir`
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(TASKS_FILE)
    }

    /// Load `<dir>/.keelson/tasks.json`
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ReleaseError::TaskNotFound(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write `<dir>/.keelson/tasks.json`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> TaskSet {
        let mut set = TaskSet::new();
        set.add(Task::new("default").exec("keelson synth"));
        set.add(
            Task::new("build")
                .with_description("Full build")
                .spawn("default")
                .step(TaskStep::exec("yarn workspaces run build").receive_args()),
        );
        set.add(Task::new("bump").env("OUTFILE", "package.json").builtin("bump"));
        set
    }

    #[test]
    fn test_step_serialization_shape() {
        let json = serde_json::to_value(TaskStep::exec("tsc").receive_args()).unwrap();
        assert_eq!(json, serde_json::json!({"exec": "tsc", "receiveArgs": true}));

        let json = serde_json::to_value(TaskStep::spawn("compile")).unwrap();
        assert_eq!(json, serde_json::json!({"spawn": "compile"}));
    }

    #[test]
    fn test_step_parse() {
        let step: TaskStep =
            serde_json::from_str(r#"{"builtin": "bump", "env": {"A": "1"}}"#).unwrap();
        assert_eq!(step.action, StepAction::Builtin("bump".to_string()));
        assert_eq!(step.env.get("A").map(String::as_str), Some("1"));
        assert!(!step.receive_args);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut set = sample();
        assert!(set.remove("build").is_some());
        assert!(set.remove("build").is_none());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["default", "bump"]);
    }

    #[test]
    fn test_reset_creates_or_clears() {
        let mut set = sample();
        set.reset("build").steps.push(TaskStep::exec("make"));
        let build = set.get("build").unwrap();
        assert_eq!(build.steps, vec![TaskStep::exec("make")]);
        assert_eq!(build.description.as_deref(), Some("Full build"));

        set.reset("watch");
        assert!(set.get("watch").unwrap().steps.is_empty());
    }

    #[test]
    fn test_spawn_targets() {
        let mut set = sample();
        assert!(set.check_spawn_targets().is_ok());

        set.remove("default");
        let err = set.check_spawn_targets().unwrap_err();
        assert!(err.to_string().contains("default (spawned by build)"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let set = sample();
        let path = set.save(temp.path()).unwrap();
        assert_eq!(path, temp.path().join(".keelson/tasks.json"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("}\n"));
        assert!(content.contains("\"receiveArgs\": true"));

        let loaded = TaskSet::load(temp.path()).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_load_missing() {
        let temp = TempDir::new().unwrap();
        assert!(TaskSet::load(temp.path()).is_err());
    }
}
