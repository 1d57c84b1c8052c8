//! The monorepo root project

use std::path::{Path, PathBuf};

use keelson_adapters::npm::MANIFEST_FILE;
use keelson_adapters::{PackageJson, WildcardResolver};
use keelson_core::config::{ReleaseOptions, TASKS_FILE};
use keelson_core::error::Result;
use keelson_core::monorepo::{
    InstallCoordinator, InstallDelegate, PackageInstaller, WorkspaceGraph, WorkspacePackage,
    WorkspaceReference,
};
use keelson_core::types::PackageManager;
use keelson_release::ReleaseOrchestrator;
use keelson_tasks::BuildTaskComposer;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::manifest::{package_manifest, RootManifest};
use crate::synth::{SynthFile, SynthPlan, SynthReport};

/// Options of the root project
#[derive(Debug, Clone)]
pub struct MonorepoOptions {
    /// Root package name
    pub name: String,
    /// Root package description
    pub description: Option<String>,
    /// Repository URL written into every manifest
    pub repository: Option<String>,
    /// Branch releases are cut from
    pub default_release_branch: String,
    /// Package manager driving the workspace
    pub package_manager: PackageManager,
    /// Whether GitHub workflows are generated
    pub github: bool,
    /// Root development dependencies, `name[@range]`
    pub dev_deps: Vec<String>,
    /// Release settings; `None` disables releasing
    pub release: Option<ReleaseOptions>,
}

impl Default for MonorepoOptions {
    fn default() -> Self {
        Self {
            name: "monorepo".to_string(),
            description: None,
            repository: None,
            default_release_branch: "main".to_string(),
            package_manager: PackageManager::default(),
            github: true,
            dev_deps: Vec::new(),
            release: None,
        }
    }
}

/// Root of a Yarn workspaces monorepo
#[derive(Debug)]
pub struct Monorepo {
    options: MonorepoOptions,
    graph: WorkspaceGraph,
    composer: BuildTaskComposer,
    /// Configured orchestrator with no packages; cloned for every pass
    orchestrator: Option<ReleaseOrchestrator>,
}

impl Monorepo {
    /// Create the root project.
    ///
    /// Fails when release is enabled without GitHub integration, or with
    /// both major version options set.
    pub fn new(options: MonorepoOptions) -> Result<Self> {
        let orchestrator = match &options.release {
            Some(release) => Some(ReleaseOrchestrator::new(
                release.clone(),
                &options.default_release_branch,
                options.package_manager,
                options.github,
            )?),
            None => None,
        };
        info!(name = %options.name, release = orchestrator.is_some(), "created monorepo");

        Ok(Self {
            composer: BuildTaskComposer::new(options.package_manager),
            options,
            graph: WorkspaceGraph::new(),
            orchestrator,
        })
    }

    /// Root options
    pub fn options(&self) -> &MonorepoOptions {
        &self.options
    }

    /// The workspace graph
    pub fn graph(&self) -> &WorkspaceGraph {
        &self.graph
    }

    /// Whether releasing is enabled
    pub fn releases(&self) -> bool {
        self.orchestrator.is_some()
    }

    /// Register a workspace package and hand back a reference siblings can
    /// depend on
    pub fn add_workspace(&mut self, package: WorkspacePackage) -> Result<WorkspaceReference> {
        if let Some(orchestrator) = &self.orchestrator {
            orchestrator.check_workspace(&package, self.graph.all_packages())?;
        }
        let reference = package.reference();
        self.graph.register(package)?;
        Ok(reference)
    }

    /// Compute every file of a synthesis pass without touching the disk.
    ///
    /// `outdir` is only read, to keep ranges already pinned in existing
    /// manifests.
    #[instrument(skip_all, fields(outdir = %outdir.display()))]
    pub fn plan(&self, outdir: &Path) -> Result<SynthPlan> {
        let order = self.graph.topological_order()?;
        let mut orchestrator = self.orchestrator.clone();
        let mut plan = SynthPlan::default();
        let repository = self.options.repository.as_deref();

        for package in &order {
            let mut tasks = self.composer.package_tasks(package);
            if let Some(orchestrator) = orchestrator.as_mut() {
                orchestrator.add_workspace(package, &mut tasks)?;
            }
            tasks.check_spawn_targets()?;

            let dir = PathBuf::from(&package.directory);
            let existing = PackageJson::try_load_from_dir(&outdir.join(&dir));
            let manifest = package_manifest(package, &tasks, repository, existing.as_ref());

            plan.files.push(SynthFile::new(dir.join(MANIFEST_FILE), render_json(&manifest)?));
            plan.files.push(SynthFile::new(dir.join(TASKS_FILE), tasks.to_json()?));
            plan.packages.push(package.directory.clone());
            debug!(package = %package.name, tasks = tasks.names().count(), "planned package");
        }

        let mut root_tasks = self.composer.root_tasks();
        if let Some(task) = orchestrator.as_ref().and_then(ReleaseOrchestrator::release_task) {
            root_tasks.add(task);
        }
        root_tasks.check_spawn_targets()?;

        let existing = PackageJson::try_load_from_dir(outdir);
        let root = RootManifest {
            name: &self.options.name,
            description: self.options.description.as_deref(),
            repository,
            dev_deps: &self.options.dev_deps,
        };
        let manifest = root.render(&root_tasks, &self.graph, existing.as_ref())?;
        plan.files.push(SynthFile::new(MANIFEST_FILE, render_json(&manifest)?));
        plan.files.push(SynthFile::new(TASKS_FILE, root_tasks.to_json()?));

        if let Some(orchestrator) = orchestrator.as_mut() {
            if let Some(generated) = orchestrator.build_workflow()? {
                let path = Path::new(".github/workflows").join(&generated.file_name);
                plan.files.push(SynthFile::new(path, generated.workflow.to_yaml()?));
                plan.workflow = Some(generated.file_name);
            }
        }

        Ok(plan)
    }

    /// Write every generated file, then queue one install request for the
    /// root and each package with `installs`.
    ///
    /// Nothing is written when planning fails.
    pub fn synth(&self, outdir: &Path, installs: &mut dyn InstallDelegate) -> Result<SynthReport> {
        let plan = self.plan(outdir)?;
        let files = plan.write(outdir)?;

        let targets = std::iter::once((self.options.name.clone(), outdir.to_path_buf())).chain(
            self.graph
                .all_packages()
                .iter()
                .map(|p| (p.name.clone(), outdir.join(&p.directory))),
        );
        for (name, dir) in targets {
            let resolver = WildcardResolver::new(dir);
            installs.request_install(&name, Box::new(move |_: &Path| resolver.resolve_and_write()));
        }

        info!(files = files.len(), packages = plan.packages.len(), "synthesized monorepo");
        Ok(SynthReport {
            files,
            packages: plan.packages,
            workflow: plan.workflow,
            install: None,
        })
    }

    /// Synthesize, then run the deferred install with `installer`
    pub fn synth_with_install(&self, outdir: &Path, installer: &dyn PackageInstaller) -> Result<SynthReport> {
        let mut coordinator = InstallCoordinator::new();
        let mut report = self.synth(outdir, &mut coordinator)?;
        report.install = Some(coordinator.flush(installer, outdir)?);
        Ok(report)
    }
}

fn render_json(doc: &Value) -> Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(doc)?))
}
