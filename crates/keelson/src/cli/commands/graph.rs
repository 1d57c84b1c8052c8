//! Graph command

use clap::Args;
use console::style;
use serde_json::json;
use tracing::info;

use crate::cli::output::{path_style, Printer};
use crate::cli::Cli;

use super::load_monorepo;

/// Show the workspace dependency graph
#[derive(Debug, Args)]
pub struct GraphCommand {
    /// Show packages affected by a change to this package
    #[arg(long)]
    pub dependents: Option<String>,
}

impl GraphCommand {
    /// Execute the graph command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dependents = ?self.dependents, "executing graph command");
        let cwd = std::env::current_dir()?;
        let (monorepo, _) = load_monorepo(&cwd)?;
        let graph = monorepo.graph();
        let out = Printer::new(cli);

        if let Some(name) = &self.dependents {
            if !graph.contains(name) {
                anyhow::bail!("Unknown workspace package '{}'", name);
            }
            let dependents: Vec<&str> = graph
                .transitive_dependents(name)
                .into_iter()
                .map(|p| p.name.as_str())
                .collect();
            return out.report(json!({ "package": name, "dependents": dependents }), |out| {
                out.heading(format!("Packages depending on {}", name));
                for dependent in &dependents {
                    println!("  {}", dependent);
                }
            });
        }

        let order = graph.topological_order()?;
        let mut layers = Vec::with_capacity(order.len());
        for package in order {
            let deps: Vec<&str> = graph
                .workspace_dependencies(&package.name)?
                .into_iter()
                .map(|r| r.name.as_str())
                .collect();
            layers.push((package, deps));
        }

        let packages: Vec<_> = layers
            .iter()
            .map(|(package, deps)| {
                json!({
                    "name": package.name,
                    "directory": package.directory,
                    "private": package.private,
                    "dependencies": deps,
                })
            })
            .collect();

        out.report(json!({ "packages": packages }), |out| {
            out.heading("Build order");
            for (i, (package, deps)) in layers.iter().enumerate() {
                let visibility = if package.private { " (private)" } else { "" };
                println!(
                    "  {}. {}{}  {}",
                    i + 1,
                    style(&package.name).bold(),
                    style(visibility).dim(),
                    path_style().apply_to(&package.directory)
                );
                for dep in deps {
                    println!("       {} {}", style("└─").dim(), dep);
                }
            }
        })
    }
}
