//! Run command - execute a task from `.keelson/tasks.json`

use clap::Args;
use console::style;
use serde_json::json;
use tracing::info;

use keelson_release::ReleaseBuiltins;
use keelson_tasks::TaskRuntime;

use crate::cli::output::Printer;
use crate::cli::Cli;

/// Run a task from .keelson/tasks.json
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Task to run; lists the tasks when omitted
    pub task: Option<String>,

    /// Arguments appended to steps that receive them
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl RunCommand {
    /// Execute the run command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let builtins = ReleaseBuiltins;
        let runtime = TaskRuntime::load(&cwd, &builtins)?;

        let Some(task) = &self.task else {
            return self.list(&runtime, cli);
        };

        info!(task = %task, args = self.args.len(), "executing run command");
        runtime.run(task, &self.args)?;
        Ok(())
    }

    fn list(&self, runtime: &TaskRuntime<'_>, cli: &Cli) -> anyhow::Result<()> {
        let tasks = runtime.tasks();
        let entries: Vec<_> = tasks
            .names()
            .filter_map(|name| tasks.get(name))
            .map(|task| {
                json!({
                    "name": task.name,
                    "description": task.description,
                    "steps": task.steps.iter().map(|s| s.describe()).collect::<Vec<_>>(),
                })
            })
            .collect();

        Printer::new(cli).report(json!(entries), |out| {
            out.heading("Tasks");
            for name in tasks.names() {
                let description = tasks
                    .get(name)
                    .and_then(|t| t.description.as_deref())
                    .unwrap_or("");
                println!("  {:<20} {}", style(name).cyan(), style(description).dim());
            }
        })
    }
}
