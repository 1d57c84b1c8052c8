//! Task runtime
//!
//! Executes tasks from a [`TaskSet`] one step at a time. Spawned tasks run
//! inline and inherit the environment of the task that spawned them.

use std::path::{Path, PathBuf};
use std::process::Command;

use indexmap::IndexMap;
use keelson_core::error::{ReleaseError, Result};
use tracing::{debug, info};

use crate::task::{StepAction, Task, TaskSet};

/// Handles `builtin` steps
pub trait BuiltinRunner {
    /// Run builtin `name` in `cwd` with the step's resolved environment
    fn run_builtin(&self, name: &str, cwd: &Path, env: &IndexMap<String, String>) -> Result<()>;
}

/// Rejects every builtin
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBuiltins;

impl BuiltinRunner for NoBuiltins {
    fn run_builtin(&self, name: &str, _cwd: &Path, _env: &IndexMap<String, String>) -> Result<()> {
        Err(ReleaseError::TaskFailed {
            task: name.to_string(),
            reason: "no builtin handler available".to_string(),
        }
        .into())
    }
}

/// Runs tasks rooted at a project directory
pub struct TaskRuntime<'a> {
    root: PathBuf,
    tasks: TaskSet,
    builtins: &'a dyn BuiltinRunner,
}

impl<'a> TaskRuntime<'a> {
    /// Create a runtime for `tasks` defined in `root`
    pub fn new(root: impl Into<PathBuf>, tasks: TaskSet, builtins: &'a dyn BuiltinRunner) -> Self {
        Self {
            root: root.into(),
            tasks,
            builtins,
        }
    }

    /// Load `<root>/.keelson/tasks.json`
    pub fn load(root: impl Into<PathBuf>, builtins: &'a dyn BuiltinRunner) -> Result<Self> {
        let root = root.into();
        let tasks = TaskSet::load(&root)?;
        Ok(Self::new(root, tasks, builtins))
    }

    /// The task set
    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    /// Run task `name`, passing `args` to steps that receive them
    pub fn run(&self, name: &str, args: &[String]) -> Result<()> {
        let env = self.tasks.env.clone();
        let mut stack = Vec::new();
        self.run_task(name, args, &env, &mut stack)
    }

    fn run_task(
        &self,
        name: &str,
        args: &[String],
        inherited: &IndexMap<String, String>,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| ReleaseError::TaskNotFound(name.to_string()))?;

        if stack.iter().any(|t| t == name) {
            return Err(ReleaseError::TaskFailed {
                task: name.to_string(),
                reason: format!("recursive spawn: {} -> {}", stack.join(" -> "), name),
            }
            .into());
        }
        stack.push(name.to_string());

        info!(task = name, "running task");
        let mut env = inherited.clone();
        env.extend(task.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        for step in &task.steps {
            let mut step_env = env.clone();
            step_env.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));
            let cwd = match &step.cwd {
                Some(dir) => self.root.join(dir),
                None => self.root.clone(),
            };
            let step_args: &[String] = if step.receive_args { args } else { &[] };

            debug!(task = name, step = %step.describe(), "running step");
            match &step.action {
                StepAction::Exec(command) => run_exec(task, command, step_args, &cwd, &step_env)?,
                StepAction::Spawn(target) => self.run_task(target, step_args, &step_env, stack)?,
                StepAction::Builtin(builtin) => self.builtins.run_builtin(builtin, &cwd, &step_env)?,
            }
        }

        stack.pop();
        Ok(())
    }
}

/// Run `command` through `sh -c`, appending `args`
fn run_exec(
    task: &Task,
    command: &str,
    args: &[String],
    cwd: &Path,
    env: &IndexMap<String, String>,
) -> Result<()> {
    let line = command_line(command, args);
    let status = Command::new("sh")
        .arg("-c")
        .arg(&line)
        .current_dir(cwd)
        .envs(env)
        .status()
        .map_err(|e| ReleaseError::TaskFailed {
            task: task.name.clone(),
            reason: format!("failed to spawn `{}`: {}", line, e),
        })?;

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        return Err(ReleaseError::TaskFailed {
            task: task.name.clone(),
            reason: format!("`{}` exited with code {}", line, code),
        }
        .into());
    }
    Ok(())
}

/// Join a command and its arguments, quoting arguments for `sh`
pub fn command_line(command: &str, args: &[String]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg));
    }
    line
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./@:,+%^~*".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStep;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingBuiltins {
        calls: RefCell<Vec<(String, Option<String>)>>,
    }

    impl BuiltinRunner for RecordingBuiltins {
        fn run_builtin(&self, name: &str, _cwd: &Path, env: &IndexMap<String, String>) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((name.to_string(), env.get("OUTFILE").cloned()));
            Ok(())
        }
    }

    #[test]
    fn test_command_line_quoting() {
        let args = vec!["A=exact".to_string(), "two words".to_string(), "it's".to_string()];
        assert_eq!(
            command_line("keelson gather-versions", &args),
            "keelson gather-versions A=exact 'two words' 'it'\\''s'"
        );
        assert_eq!(command_line("echo", &[]), "echo");
    }

    #[test]
    fn test_exec_env_and_args() {
        let temp = TempDir::new().unwrap();
        let mut set = TaskSet::new();
        set.env.insert("GLOBAL".to_string(), "g".to_string());
        set.add(
            Task::new("write")
                .env("TASK", "t")
                .step(TaskStep::exec("echo $GLOBAL $TASK $STEP > out.txt").env("STEP", "s"))
                .step(TaskStep::exec("echo >> out.txt").receive_args()),
        );

        let runtime = TaskRuntime::new(temp.path(), set, &NoBuiltins);
        runtime.run("write", &["extra".to_string()]).unwrap();

        let out = std::fs::read_to_string(temp.path().join("out.txt")).unwrap();
        assert_eq!(out, "g t s\nextra\n");
    }

    #[test]
    fn test_spawn_inherits_env() {
        let temp = TempDir::new().unwrap();
        let mut set = TaskSet::new();
        set.add(Task::new("child").exec("echo $PARENT > child.txt"));
        set.add(Task::new("parent").env("PARENT", "yes").spawn("child"));

        let runtime = TaskRuntime::new(temp.path(), set, &NoBuiltins);
        runtime.run("parent", &[]).unwrap();

        let out = std::fs::read_to_string(temp.path().join("child.txt")).unwrap();
        assert_eq!(out.trim(), "yes");
    }

    #[test]
    fn test_failure_stops_task() {
        let temp = TempDir::new().unwrap();
        let mut set = TaskSet::new();
        set.add(Task::new("broken").exec("exit 3").exec("touch never"));

        let runtime = TaskRuntime::new(temp.path(), set, &NoBuiltins);
        let err = runtime.run("broken", &[]).unwrap_err();
        assert!(err.to_string().contains("exited with code 3"));
        assert!(!temp.path().join("never").exists());
    }

    #[test]
    fn test_missing_task_and_recursion() {
        let temp = TempDir::new().unwrap();
        let mut set = TaskSet::new();
        set.add(Task::new("a").spawn("b"));
        set.add(Task::new("b").spawn("a"));

        let runtime = TaskRuntime::new(temp.path(), set, &NoBuiltins);
        assert!(runtime.run("missing", &[]).is_err());
        let err = runtime.run("a", &[]).unwrap_err();
        assert!(err.to_string().contains("recursive spawn: a -> b -> a"));
    }

    #[test]
    fn test_builtin_dispatch() {
        let temp = TempDir::new().unwrap();
        let mut set = TaskSet::new();
        set.add(Task::new("bump").env("OUTFILE", "package.json").builtin("bump"));

        let builtins = RecordingBuiltins::default();
        let runtime = TaskRuntime::new(temp.path(), set.clone(), &builtins);
        runtime.run("bump", &[]).unwrap();
        assert_eq!(
            *builtins.calls.borrow(),
            vec![("bump".to_string(), Some("package.json".to_string()))]
        );

        let rejecting = TaskRuntime::new(temp.path(), set, &NoBuiltins);
        assert!(rejecting.run("bump", &[]).is_err());
    }

    #[test]
    fn test_step_cwd() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let mut set = TaskSet::new();
        set.add(Task::new("here").step(TaskStep::exec("touch marker").in_dir("sub")));

        let runtime = TaskRuntime::new(temp.path(), set, &NoBuiltins);
        runtime.run("here", &[]).unwrap();
        assert!(temp.path().join("sub/marker").exists());
    }
}
