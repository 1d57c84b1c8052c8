//! Release orchestration
//!
//! Collects the pipeline of every workspace package, builds the root
//! `release` task that bumps, builds and unbumps all packages together, and
//! renders the single release workflow with per-package publish jobs.

use keelson_core::config::{ReleaseOptions, ReleaseTrigger};
use keelson_core::error::{ConfigError, ReleaseError, Result};
use keelson_core::github::{Job, Step, Triggers, Workflow};
use keelson_core::monorepo::WorkspacePackage;
use keelson_core::types::PackageManager;
use keelson_tasks::{Task, TaskSet};
use tracing::{debug, info, instrument};

use crate::names::{
    build_artifact_name, check_publish_step_id, publish_output_id, slugify, workflow_name, ARTIFACTS_DIR,
    GIT_REMOTE_STEP_ID, LATEST_COMMIT_OUTPUT, PERMISSION_BACKUP_FILE, RELEASE_JOB_ID,
};
use crate::pipeline::ReleasePipeline;
use crate::publisher::PackagePublisher;

/// Name of the root release task
pub const RELEASE_TASK: &str = "release";

/// Fails the release when the build changed committed files
pub const ANTI_TAMPER_COMMAND: &str = "git diff --ignore-space-at-eol --exit-code";

const CHECK_PUBLISH_COMMAND: &str = "(git ls-remote -q --exit-code --tags origin $(cat dist/releasetag.txt) && (echo \"publish=false\" >> $GITHUB_OUTPUT)) || echo \"publish=true\" >> $GITHUB_OUTPUT";

/// A rendered workflow and the file it goes to
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWorkflow {
    /// File name under `.github/workflows`
    pub file_name: String,
    /// Workflow content
    pub workflow: Workflow,
}

/// Owns the release wiring of the whole monorepo
#[derive(Debug, Clone)]
pub struct ReleaseOrchestrator {
    options: ReleaseOptions,
    branch: String,
    manager: PackageManager,
    pipelines: Vec<ReleasePipeline>,
}

impl ReleaseOrchestrator {
    /// Create an orchestrator for releases from `branch`.
    ///
    /// Fails when GitHub integration is off, since the workflow is the only
    /// publishing mechanism, and when both major version options are set.
    #[instrument(skip(options))]
    pub fn new(
        options: ReleaseOptions,
        branch: &str,
        manager: PackageManager,
        github: bool,
    ) -> Result<Self> {
        if !github {
            return Err(ConfigError::MissingCollaborator(format!(
                "Releases from branch '{}' need GitHub integration, but it is disabled",
                branch
            ))
            .into());
        }
        if options.trigger == ReleaseTrigger::Scheduled && options.schedule.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "release.schedule".to_string(),
                message: "a scheduled trigger needs a cron expression".to_string(),
            }
            .into());
        }
        if options.major_version.is_some() && options.min_major_version.is_some() {
            return Err(ConfigError::MutuallyExclusiveOption {
                package: "release".to_string(),
                first: "minMajorVersion".to_string(),
                second: "majorVersion".to_string(),
            }
            .into());
        }

        Ok(Self {
            options,
            branch: branch.to_string(),
            manager,
            pipelines: Vec::new(),
        })
    }

    /// Release options
    pub fn options(&self) -> &ReleaseOptions {
        &self.options
    }

    /// Check `package` before it joins the monorepo: its major version
    /// options against the monorepo's, and its workflow id against the
    /// public packages in `others`
    pub fn check_workspace<'a>(
        &self,
        package: &WorkspacePackage,
        others: impl IntoIterator<Item = &'a WorkspacePackage>,
    ) -> Result<()> {
        package
            .release_config()
            .validate_against(&package.name, &self.options)?;
        if package.private {
            return Ok(());
        }
        let slug = slugify(&package.name);
        let taken = others
            .into_iter()
            .find(|p| !p.private && p.name != package.name && slugify(&p.name) == slug);
        if let Some(taken) = taken {
            return Err(ConfigError::IdCollision {
                slug,
                first: taken.name.clone(),
                second: package.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Add the release tasks of `package` to `tasks`.
    ///
    /// Call in topological order; the workflow lists packages in the order
    /// they were added. Fails when the package's major version options
    /// clash with the monorepo's, or when its workflow id is already taken.
    #[instrument(skip(self, package, tasks), fields(package = %package.name))]
    pub fn add_workspace(&mut self, package: &WorkspacePackage, tasks: &mut TaskSet) -> Result<&ReleasePipeline> {
        let mut pipeline = ReleasePipeline::with_monorepo(package, &self.options)?;
        if pipeline.is_released() {
            let slug = slugify(pipeline.package());
            if let Some(taken) = self.released().find(|p| slugify(p.package()) == slug) {
                return Err(ConfigError::IdCollision {
                    slug,
                    first: taken.package().to_string(),
                    second: pipeline.package().to_string(),
                }
                .into());
            }
        }
        pipeline.apply(tasks);
        debug!(released = pipeline.is_released(), "added release pipeline");
        self.pipelines.push(pipeline);
        Ok(&self.pipelines[self.pipelines.len() - 1])
    }

    /// Every pipeline, in the order added
    pub fn pipelines(&self) -> &[ReleasePipeline] {
        &self.pipelines
    }

    /// Pipelines of packages that are versioned and published
    pub fn released(&self) -> impl Iterator<Item = &ReleasePipeline> {
        self.pipelines.iter().filter(|p| p.is_released())
    }

    /// The root `release` task, present once any public package is added
    pub fn release_task(&self) -> Option<Task> {
        self.released().next()?;

        let pm = self.manager;
        let mut task = Task::new(RELEASE_TASK)
            .with_description("Prepare a release from all monorepo packages")
            .env("RELEASE", "true");
        if let Some(major) = self.options.major_version {
            task = task.env("MAJOR", major.to_string());
        }
        if let Some(min_major) = self.options.min_major_version {
            task = task.env("MIN_MAJOR", min_major.to_string());
        }

        Some(
            task.exec(pm.fan_out(&format!("shx rm -rf {}", ARTIFACTS_DIR)))
                .exec(pm.fan_out("bump"))
                .exec(pm.fan_out("build"))
                .exec(pm.fan_out("unbump"))
                .exec(ANTI_TAMPER_COMMAND),
        )
    }

    /// Render the release workflow.
    ///
    /// `None` when no public package is released. Continuous releases run
    /// on every push to the branch, scheduled ones on their cron expression.
    #[instrument(skip(self))]
    pub fn build_workflow(&mut self) -> Result<Option<GeneratedWorkflow>> {
        if self.released().next().is_none() {
            debug!("no released packages, skipping release workflow");
            return Ok(None);
        }
        if self.options.trigger == ReleaseTrigger::Manual {
            return Err(ReleaseError::UnsupportedTrigger(format!(
                "{} (manual publishing is not supported)",
                self.options.trigger
            ))
            .into());
        }

        let name = workflow_name(&self.branch, self.options.workflow_name.as_deref());
        let triggers = match (&self.options.trigger, &self.options.schedule) {
            (ReleaseTrigger::Scheduled, Some(cron)) => Triggers::schedule_and_dispatch(cron),
            _ => Triggers::push_and_dispatch(&self.branch),
        };
        let mut workflow = Workflow::new(&name, triggers);
        workflow.add_job(RELEASE_JOB_ID, self.release_job());

        for pipeline in self.released() {
            for (id, job) in PackagePublisher::new(pipeline, &self.options).jobs() {
                workflow.add_job(id, job);
            }
        }
        for pipeline in &mut self.pipelines {
            pipeline.mark_merged();
        }

        info!(workflow = %name, jobs = workflow.jobs.len(), "rendered release workflow");
        Ok(Some(GeneratedWorkflow {
            file_name: format!("{}.yml", name),
            workflow,
        }))
    }

    fn release_job(&self) -> Job {
        let pm = self.manager;
        let mut job = Job::new(self.options.runs_on.clone())
            .permission("contents", "write")
            .env("CI", "true")
            .output(
                LATEST_COMMIT_OUTPUT,
                format!("${{{{ steps.{}.outputs.{} }}}}", GIT_REMOTE_STEP_ID, LATEST_COMMIT_OUTPUT),
            );
        if let Some(image) = &self.options.workflow_container_image {
            job = job.in_container(image.clone());
        }
        for pipeline in self.released() {
            job = job.output(
                publish_output_id(pipeline.package()),
                format!(
                    "${{{{ steps.{}.outputs.publish }}}}",
                    check_publish_step_id(pipeline.package())
                ),
            );
        }

        job = job
            .step(Step::uses("Checkout", "actions/checkout@v4").input("fetch-depth", 0))
            .step(Step::run(
                "Set git identity",
                "git config user.name \"github-actions\"\ngit config user.email \"github-actions@github.com\"",
            ))
            .step(
                Step::uses("Setup Node.js", "actions/setup-node@v4")
                    .input("node-version", self.options.node_version.clone()),
            )
            .step(Step::run("Install dependencies", pm.frozen_install_command()));
        for command in &self.options.setup_steps {
            job = job.step(Step::run(command.clone(), command.clone()));
        }
        job = job.step(Step::run(RELEASE_TASK, format!("keelson run {}", RELEASE_TASK)));
        for command in &self.options.post_build_steps {
            job = job.step(Step::run(command.clone(), command.clone()));
        }

        for pipeline in self.released() {
            job = job.step(
                Step::run(
                    format!("{}: Check if version has already been released", pipeline.package()),
                    CHECK_PUBLISH_COMMAND,
                )
                .with_id(check_publish_step_id(pipeline.package()))
                .in_dir(pipeline.directory()),
            );
        }
        job = job.step(
            Step::run(
                "Check for new commits",
                format!(
                    "echo \"{}=$(git ls-remote origin -h ${{{{ github.ref }}}} | cut -f1)\" >> $GITHUB_OUTPUT",
                    LATEST_COMMIT_OUTPUT
                ),
            )
            .with_id(GIT_REMOTE_STEP_ID),
        );

        let no_new_commits = format!(
            "${{{{ steps.{}.outputs.{} == github.sha }}}}",
            GIT_REMOTE_STEP_ID, LATEST_COMMIT_OUTPUT
        );
        for pipeline in self.released() {
            let package = pipeline.package();
            job = job
                .step(
                    Step::run(
                        format!("{}: Backup artifact permissions", package),
                        format!("cd {} && getfacl -R . > {}", ARTIFACTS_DIR, PERMISSION_BACKUP_FILE),
                    )
                    .when(no_new_commits.clone())
                    .continue_on_error()
                    .in_dir(pipeline.directory()),
                )
                .step(
                    Step::uses(format!("{}: Upload artifact", package), "actions/upload-artifact@v4")
                        .when(no_new_commits.clone())
                        .input("name", build_artifact_name(package))
                        .input("path", format!("{}/{}", pipeline.directory(), ARTIFACTS_DIR)),
                );
        }
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_core::monorepo::ReleaseConfig;
    use keelson_core::types::DependencyKind;

    fn enabled() -> ReleaseOptions {
        ReleaseOptions {
            enabled: true,
            ..Default::default()
        }
    }

    fn orchestrator(options: ReleaseOptions, branch: &str) -> ReleaseOrchestrator {
        ReleaseOrchestrator::new(options, branch, PackageManager::YarnClassic, true).unwrap()
    }

    fn add(orchestrator: &mut ReleaseOrchestrator, package: &WorkspacePackage) -> TaskSet {
        let mut tasks = TaskSet::new();
        orchestrator.add_workspace(package, &mut tasks).unwrap();
        tasks
    }

    #[test]
    fn test_requires_github() {
        let err = ReleaseOrchestrator::new(enabled(), "main", PackageManager::YarnClassic, false).unwrap_err();
        assert!(matches!(
            err,
            keelson_core::KeelsonError::Config(ConfigError::MissingCollaborator(_))
        ));
    }

    #[test]
    fn test_major_options_exclusive() {
        let options = ReleaseOptions {
            major_version: Some(1),
            min_major_version: Some(1),
            ..enabled()
        };
        let err = ReleaseOrchestrator::new(options, "main", PackageManager::YarnClassic, true).unwrap_err();
        assert!(err.to_string().contains("minMajorVersion and majorVersion cannot be used together"));
    }

    #[test]
    fn test_private_only_has_no_release() {
        let mut orch = orchestrator(enabled(), "main");
        add(&mut orch, &WorkspacePackage::new("internal").private());
        assert!(orch.release_task().is_none());
        assert!(orch.build_workflow().unwrap().is_none());
    }

    #[test]
    fn test_release_task() {
        let options = ReleaseOptions {
            major_version: Some(3),
            ..enabled()
        };
        let mut orch = orchestrator(options, "main");
        add(&mut orch, &WorkspacePackage::new("one"));

        let task = orch.release_task().unwrap();
        assert_eq!(task.env["RELEASE"], "true");
        assert_eq!(task.env["MAJOR"], "3");
        assert!(!task.env.contains_key("MIN_MAJOR"));
        let commands: Vec<String> = task.steps.iter().map(|s| s.describe()).collect();
        assert_eq!(
            commands,
            vec![
                "yarn workspaces run shx rm -rf dist",
                "yarn workspaces run bump",
                "yarn workspaces run build",
                "yarn workspaces run unbump",
                "git diff --ignore-space-at-eol --exit-code",
            ]
        );
    }

    #[test]
    fn test_workflow_shape() {
        let mut orch = orchestrator(enabled(), "main");
        let two = WorkspacePackage::new("@cdklabs/two");
        add(&mut orch, &two);
        add(
            &mut orch,
            &WorkspacePackage::new("@cdklabs/one").depends_on(two.reference(), DependencyKind::Runtime),
        );
        add(&mut orch, &WorkspacePackage::new("internal").private());

        let generated = orch.build_workflow().unwrap().unwrap();
        assert_eq!(generated.file_name, "release.yml");

        let ids: Vec<&str> = generated.workflow.jobs.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec![
                "release",
                "cdklabs-two_release_npm",
                "cdklabs-two_release_github",
                "cdklabs-one_release_npm",
                "cdklabs-one_release_github",
            ]
        );

        let one_github = generated.workflow.job("cdklabs-one_release_github").unwrap();
        assert_eq!(one_github.needs, vec!["release", "cdklabs-one_release_npm"]);
        // No cross-package edges.
        assert!(!one_github.needs.iter().any(|n| n.starts_with("cdklabs-two")));

        let release = generated.workflow.job("release").unwrap();
        assert_eq!(
            release.outputs["latest_commit"],
            "${{ steps.git_remote.outputs.latest_commit }}"
        );
        assert_eq!(
            release.outputs["publish-cdklabs-one"],
            "${{ steps.check-publish-cdklabs-one.outputs.publish }}"
        );
        assert!(!release.outputs.contains_key("publish-internal"));

        let check = release.find_step("check-publish-cdklabs-one").unwrap();
        assert_eq!(check.working_directory.as_deref(), Some("packages/@cdklabs/one"));
        assert!(check.run.as_deref().unwrap().contains("$(cat dist/releasetag.txt)"));
        assert!(release.find_step("git_remote").is_some());

        let upload = release
            .steps
            .iter()
            .find(|s| s.name.as_deref() == Some("@cdklabs/one: Upload artifact"))
            .unwrap();
        assert_eq!(upload.with["name"], "cdklabs-one_build-artifact");
        assert_eq!(upload.with["path"], "packages/@cdklabs/one/dist");

        assert!(orch
            .pipelines()
            .iter()
            .filter(|p| p.is_released())
            .all(|p| p.state() == crate::pipeline::PipelineState::MergedIntoWorkflow));
    }

    #[test]
    fn test_branch_workflow_name() {
        let mut orch = orchestrator(enabled(), "v2");
        add(&mut orch, &WorkspacePackage::new("one"));
        let generated = orch.build_workflow().unwrap().unwrap();
        assert_eq!(generated.file_name, "release-v2.yml");
        assert_eq!(generated.workflow.on.push.unwrap().branches, vec!["v2"]);
    }

    #[test]
    fn test_manual_trigger_unsupported() {
        let options = ReleaseOptions {
            trigger: ReleaseTrigger::Manual,
            ..enabled()
        };
        let mut orch = orchestrator(options, "main");
        add(&mut orch, &WorkspacePackage::new("one"));
        let err = orch.build_workflow().unwrap_err();
        assert!(err.to_string().contains("Unsupported release trigger"));
    }

    #[test]
    fn test_package_major_clashes_with_monorepo_major() {
        let options = ReleaseOptions {
            major_version: Some(2),
            ..enabled()
        };
        let mut orch = orchestrator(options, "main");
        let pkg = WorkspacePackage::new("one").with_release(ReleaseConfig {
            min_major_version: Some(1),
            ..Default::default()
        });
        let mut tasks = TaskSet::new();
        let err = orch.add_workspace(&pkg, &mut tasks).unwrap_err();
        assert_eq!(err.to_string(), "one: minMajorVersion and majorVersion cannot be used together");
        assert!(orch.pipelines().is_empty());
        assert!(tasks.get("bump").is_none());
    }

    #[test]
    fn test_colliding_workflow_ids_rejected() {
        let mut orch = orchestrator(enabled(), "main");
        add(&mut orch, &WorkspacePackage::new("@a/b"));
        let mut tasks = TaskSet::new();
        let err = orch.add_workspace(&WorkspacePackage::new("a-b"), &mut tasks).unwrap_err();
        assert!(matches!(
            err,
            keelson_core::KeelsonError::Config(ConfigError::IdCollision { ref slug, .. }) if slug == "a-b"
        ));

        // private packages render no jobs, so they never collide
        add(&mut orch, &WorkspacePackage::new("a_b").private());
        add(&mut orch, &WorkspacePackage::new("@x/a-b").with_directory("packages/x").private());
        assert_eq!(orch.released().count(), 1);
    }

    #[test]
    fn test_scheduled_trigger_and_container() {
        let options = ReleaseOptions {
            trigger: ReleaseTrigger::Scheduled,
            schedule: Some("0 5 * * 1".to_string()),
            workflow_container_image: Some("jsii/superchain:1-bookworm-slim".to_string()),
            ..enabled()
        };
        let mut orch = orchestrator(options, "main");
        add(&mut orch, &WorkspacePackage::new("one"));
        let workflow = orch.build_workflow().unwrap().unwrap().workflow;

        assert!(workflow.on.push.is_none());
        assert_eq!(workflow.on.schedule[0].cron, "0 5 * * 1");
        assert!(workflow.on.workflow_dispatch.is_some());
        let release = workflow.job("release").unwrap();
        assert_eq!(
            release.container.as_ref().unwrap().image,
            "jsii/superchain:1-bookworm-slim"
        );
        // publish jobs run on the plain runner
        assert!(workflow.job("one_release_npm").unwrap().container.is_none());
    }

    #[test]
    fn test_scheduled_trigger_needs_cron() {
        let options = ReleaseOptions {
            trigger: ReleaseTrigger::Scheduled,
            ..enabled()
        };
        let err = ReleaseOrchestrator::new(options, "main", PackageManager::YarnClassic, true).unwrap_err();
        assert!(err.to_string().contains("release.schedule"));
    }

    #[test]
    fn test_monorepo_publish_defaults() {
        let options = ReleaseOptions {
            npm_dist_tag: Some("next".to_string()),
            publish_to_npm: Some(false),
            ..enabled()
        };
        let mut orch = orchestrator(options, "main");
        add(&mut orch, &WorkspacePackage::new("quiet"));
        add(
            &mut orch,
            &WorkspacePackage::new("loud").with_release(ReleaseConfig {
                publish_to_npm: Some(true),
                ..Default::default()
            }),
        );
        let workflow = orch.build_workflow().unwrap().unwrap().workflow;

        assert!(workflow.job("quiet_release_npm").is_none());
        assert!(workflow.job("quiet_release_github").is_some());
        let npm = workflow.job("loud_release_npm").unwrap();
        assert_eq!(npm.steps.last().unwrap().env["NPM_DIST_TAG"], "next");
    }

    #[test]
    fn test_rendered_yaml() {
        let mut orch = orchestrator(enabled(), "main");
        add(&mut orch, &WorkspacePackage::new("one"));
        let yaml = orch.build_workflow().unwrap().unwrap().workflow.to_yaml().unwrap();
        assert!(yaml.contains("one_release_npm:"));
        assert!(yaml.contains("needs.release.outputs.publish-one == 'true'"));
        assert!(yaml.contains("keelson run release"));
    }
}
