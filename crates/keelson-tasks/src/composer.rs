//! Build task composition
//!
//! The monorepo root starts from the standard project task set and turns it
//! into a fan-out over the workspaces. Packages get their own standard set.

use keelson_core::error::Result;
use keelson_core::monorepo::{DependencyTarget, WorkspaceGraph, WorkspacePackage};
use keelson_core::types::PackageManager;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::task::{Task, TaskSet, TaskStep};

/// Command that regenerates the project files
pub const SYNTH_COMMAND: &str = "keelson synth";

/// Root tasks that make no sense once work is delegated to the workspaces
pub const REMOVED_ROOT_TASKS: [&str; 4] = ["eject", "watch", "pre-compile", "post-compile"];

/// Root tasks that simply fan out to the workspace task of the same name
pub const FAN_OUT_TASKS: [&str; 3] = ["compile", "test", "package"];

const NCU: &str = "npx npm-check-updates@16";

/// The task set every project starts with
pub fn standard_tasks(synth_command: &str) -> TaskSet {
    let mut set = TaskSet::new();
    set.add(
        Task::new("default")
            .with_description("Synthesize project files")
            .exec(synth_command),
    );
    set.add(Task::new("pre-compile").with_description("Prepare the project for compilation"));
    set.add(
        Task::new("compile")
            .with_description("Only compile")
            .exec("tsc --build"),
    );
    set.add(Task::new("post-compile").with_description("Runs after successful compilation"));
    set.add(
        Task::new("test")
            .with_description("Run tests")
            .step(TaskStep::exec("jest --passWithNoTests --updateSnapshot").receive_args()),
    );
    set.add(
        Task::new("package")
            .with_description("Creates the distribution package")
            .exec("mkdir -p dist/js")
            .exec("npm pack --pack-destination dist/js"),
    );
    set.add(
        Task::new("build")
            .with_description("Full release build")
            .spawn("default")
            .spawn("pre-compile")
            .spawn("compile")
            .spawn("post-compile")
            .spawn("test")
            .spawn("package"),
    );
    set.add(
        Task::new("watch")
            .with_description("Watch & compile in the background")
            .exec("tsc --build -w"),
    );
    set.add(
        Task::new("eject")
            .with_description("Remove keelson from the project")
            .env("KEELSON_EJECTING", "true")
            .spawn("default"),
    );
    set.add(
        Task::new("check-for-updates")
            .with_description("Check for dependency updates")
            .env("CI", "0")
            .exec(format!(
                "{} --upgrade --target=minor --peer --dep=dev,peer,prod,optional",
                NCU
            )),
    );
    set.add(Task::new("post-upgrade").with_description("Runs after upgrading dependencies"));
    set
}

/// Composes root and package task sets
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildTaskComposer {
    manager: PackageManager,
}

impl BuildTaskComposer {
    /// Create a composer for `manager`
    pub fn new(manager: PackageManager) -> Self {
        Self { manager }
    }

    /// Root task set: standard tasks rewritten to fan out to every workspace
    pub fn root_tasks(&self) -> TaskSet {
        let mut tasks = standard_tasks(SYNTH_COMMAND);
        self.compose_root(&mut tasks);
        tasks
    }

    /// Rewrite `tasks` in place for the monorepo root
    pub fn compose_root(&self, tasks: &mut TaskSet) {
        let pm = self.manager;

        tasks
            .reset("build")
            .steps
            .extend([TaskStep::spawn("default"), TaskStep::exec(pm.fan_out("build"))]);

        for name in FAN_OUT_TASKS {
            tasks.reset(name).steps.push(TaskStep::exec(pm.fan_out(name)));
        }

        if !tasks.contains("run") {
            tasks.add(Task::new("run").with_description("Run a script in every workspace"));
        }
        tasks
            .reset("run")
            .steps
            .push(TaskStep::exec(pm.fan_out("")).receive_args());

        if !tasks.contains("post-upgrade") {
            tasks.add(Task::new("post-upgrade"));
        }
        let upgrade = tasks.reset("upgrade");
        upgrade.description = Some("Upgrade dependencies in every workspace".to_string());
        upgrade.env.insert("CI".to_string(), "0".to_string());
        upgrade.steps.extend([
            TaskStep::exec(format!(
                "{} --dep=dev,optional,peer,prod,bundle --upgrade --target=minor",
                NCU
            )),
            TaskStep::exec(pm.fan_out("check-for-updates")),
            TaskStep::exec(format!("{} {}", pm.binary(), pm.install_args().join(" "))),
            TaskStep::exec(format!("{} upgrade", pm.binary())),
            TaskStep::spawn("default"),
            TaskStep::spawn("post-upgrade"),
        ]);

        for name in REMOVED_ROOT_TASKS {
            if tasks.remove(name).is_some() {
                debug!(task = name, "removed root task");
            }
        }
    }

    /// Standard task set for a workspace package
    pub fn package_tasks(&self, package: &WorkspacePackage) -> TaskSet {
        let root = relative_root(&package.directory);
        let mut tasks = standard_tasks(&format!("cd {} && {}", root, SYNTH_COMMAND));
        for name in ["eject", "post-upgrade"] {
            tasks.remove(name);
        }

        let externals: Vec<&str> = package
            .dependencies
            .iter()
            .filter_map(|d| match &d.target {
                DependencyTarget::External { name, .. } => Some(name.as_str()),
                DependencyTarget::Workspace(_) => None,
            })
            .collect();
        if let Some(check) = tasks.get_mut("check-for-updates") {
            check.reset();
            let mut command = format!(
                "{} --upgrade --target=minor --peer --dep=dev,peer,prod,optional",
                NCU
            );
            if !externals.is_empty() {
                command.push_str(&format!(" --filter={}", externals.join(",")));
            }
            check.steps.push(TaskStep::exec(command));
        }
        tasks
    }
}

/// Path from a package directory back to the monorepo root
pub fn relative_root(directory: &str) -> String {
    let depth = directory
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .count();
    if depth == 0 {
        ".".to_string()
    } else {
        vec![".."; depth].join("/")
    }
}

/// Bundled dependencies that must stay inside their package's
/// `node_modules`, as `{pkg}/{dep}` and `{pkg}/{dep}/**`, in registration
/// order
pub fn nohoist<'a>(packages: impl IntoIterator<Item = &'a WorkspacePackage>) -> Vec<String> {
    let mut entries = Vec::new();
    for package in packages {
        for dep in package.bundled_names() {
            entries.push(format!("{}/{}", package.name, dep));
            entries.push(format!("{}/{}/**", package.name, dep));
        }
    }
    entries
}

/// Workspace directories in topological order
pub fn workspace_directories(graph: &WorkspaceGraph) -> Result<Vec<String>> {
    Ok(graph
        .topological_order()?
        .into_iter()
        .map(|p| p.directory.clone())
        .collect())
}

/// The root manifest's `workspaces` object
pub fn workspaces_section(graph: &WorkspaceGraph) -> Result<Value> {
    let mut section = Map::new();
    section.insert("packages".to_string(), json!(workspace_directories(graph)?));
    let nohoist = nohoist(graph.all_packages());
    if !nohoist.is_empty() {
        section.insert("nohoist".to_string(), json!(nohoist));
    }
    Ok(Value::Object(section))
}
