//! Shell completions for the keelson binary

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory};
use clap_complete::{generate, generate_to, Shell};
use serde_json::json;
use tracing::info;

use crate::cli::output::Printer;
use crate::cli::Cli;

const BIN_NAME: &str = "keelson";

/// Generate shell completions
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long, conflicts_with = "dir")]
    pub output: Option<PathBuf>,

    /// Write the script into this directory under the shell's conventional file name
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, "executing completions command");

        let written = match (&self.output, &self.dir) {
            (Some(path), _) => {
                generate(self.shell, &mut Cli::command(), BIN_NAME, &mut File::create(path)?);
                path.clone()
            }
            (None, Some(dir)) => write_into(self.shell, dir)?,
            (None, None) => {
                generate(self.shell, &mut Cli::command(), BIN_NAME, &mut io::stdout());
                return Ok(());
            }
        };

        Printer::new(cli).report(
            json!({ "shell": self.shell.to_string(), "path": written.display().to_string() }),
            |out| out.done(format!("Completions written to {}", written.display())),
        )
    }
}

/// Write the completion script into `dir`, returning the file created
fn write_into(shell: Shell, dir: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    generate_to(shell, &mut Cli::command(), BIN_NAME, dir)
}
