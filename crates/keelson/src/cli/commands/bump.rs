//! Bump and unbump commands
//!
//! Both read their settings from the environment, the way the generated
//! `bump`/`unbump` tasks provide them.

use clap::Args;
use serde_json::json;
use tracing::info;

use keelson_release::bump::{bump, unbump, BumpOptions, DEVELOPMENT_VERSION};

use crate::cli::output::{version_style, Printer};
use crate::cli::Cli;

/// Compute the next version from the commit history
#[derive(Debug, Args)]
pub struct BumpCommand {}

impl BumpCommand {
    /// Execute the bump command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let options = BumpOptions::from_lookup(|key| std::env::var(key).ok())?;
        info!(prefix = %options.tag_prefix, "executing bump command");
        let outcome = bump(&cwd, &options)?;

        Printer::new(cli).report(
            json!({
                "version": outcome.version.to_string(),
                "tag": outcome.tag,
                "previousTag": outcome.previous_tag,
                "releasableCommits": outcome.releasable,
            }),
            |out| {
                out.heading(format!("Next version: {}", version_style().apply_to(&outcome.version)));
                out.field("tag", &outcome.tag);
                out.field("previous tag", outcome.previous_tag.as_deref().unwrap_or("none"));
                if outcome.releasable == 0 {
                    out.note("No releasable commits since the previous tag");
                }
            },
        )
    }
}

/// Restore the development version
#[derive(Debug, Args)]
pub struct UnbumpCommand {
    /// Manifest to reset
    #[arg(long, env = "OUTFILE", default_value = "package.json")]
    pub outfile: String,
}

impl UnbumpCommand {
    /// Execute the unbump command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(outfile = %self.outfile, "executing unbump command");
        let cwd = std::env::current_dir()?;
        unbump(&cwd, &self.outfile)?;

        Printer::new(cli).report(
            json!({ "outfile": self.outfile, "version": DEVELOPMENT_VERSION }),
            |out| out.done(format!("Reset {} to {}", self.outfile, DEVELOPMENT_VERSION)),
        )
    }
}

