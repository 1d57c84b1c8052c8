//! Synth command

use clap::Args;
use serde_json::json;
use tracing::info;

use keelson_adapters::YarnInstaller;
use keelson_core::monorepo::InstallCoordinator;

use crate::cli::output::Printer;
use crate::cli::Cli;

use super::load_monorepo;

/// Generate manifests, task files and the release workflow
#[derive(Debug, Args)]
pub struct SynthCommand {
    /// Show the files that would be written without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Write files but skip the dependency install
    #[arg(long)]
    pub no_install: bool,
}

impl SynthCommand {
    /// Execute the synth command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, no_install = self.no_install, "executing synth command");
        let cwd = std::env::current_dir()?;
        let (monorepo, root) = load_monorepo(&cwd)?;

        let out = Printer::new(cli);

        if self.dry_run {
            let plan = monorepo.plan(&root)?;
            return out.report(
                json!({
                    "root": root.display().to_string(),
                    "files": plan.files.iter().map(|f| f.path.display().to_string()).collect::<Vec<_>>(),
                    "packages": plan.packages,
                    "workflow": plan.workflow,
                }),
                |out| {
                    out.heading("Files that would be written");
                    out.files(plan.files.iter().map(|f| f.path.as_path()));
                },
            );
        }

        let report = if self.no_install {
            let mut coordinator = InstallCoordinator::new();
            let report = monorepo.synth(&root, &mut coordinator)?;
            info!(skipped = coordinator.pending().len(), "install skipped");
            report
        } else {
            monorepo.synth_with_install(&root, &YarnInstaller::new())?
        };

        out.report(
            json!({
                "root": root.display().to_string(),
                "files": report.files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                "packages": report.packages,
                "workflow": report.workflow,
                "installs": report.install.as_ref().map(|i| i.installs),
                "pinned": report.install.as_ref().map(|i| i.changed.clone()).unwrap_or_default(),
            }),
            |out| {
                if cli.verbose {
                    out.files(report.files.iter().map(|p| p.as_path()));
                }
                out.done(format!(
                    "Synthesized {} package(s), {} file(s)",
                    report.packages.len(),
                    report.files.len()
                ));
                if let Some(workflow) = &report.workflow {
                    out.field("workflow", format!(".github/workflows/{}", workflow));
                }
                if let Some(install) = &report.install {
                    out.field("installs", install.installs);
                    if !install.changed.is_empty() {
                        out.field("pinned", install.changed.join(", "));
                    }
                }
            },
        )
    }
}
