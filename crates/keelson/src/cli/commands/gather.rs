//! Gather-versions command

use clap::Args;
use tracing::info;

use keelson_adapters::npm::gather::USAGE;
use keelson_adapters::npm::{gather_versions, parse_args, reset_requested};

use crate::cli::output::print_json;
use crate::cli::Cli;

/// Pin sibling dependency ranges to the installed versions
#[derive(Debug, Args)]
pub struct GatherVersionsCommand {
    /// `PKG=POLICY` pairs
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl GatherVersionsCommand {
    /// Whether usage was asked for
    pub fn wants_help(&self) -> bool {
        self.args.iter().any(|a| a == "--help" || a == "-h")
    }

    /// Execute the gather-versions command
    pub fn execute(&self, _cli: &Cli) -> anyhow::Result<()> {
        if self.wants_help() {
            print!("{}", USAGE);
            return Ok(());
        }

        let requests = match parse_args(&self.args) {
            Ok(requests) => requests,
            Err(e) => {
                eprint!("{}", USAGE);
                return Err(e.into());
            }
        };

        let reset = reset_requested();
        info!(count = requests.len(), reset, "executing gather-versions command");
        let cwd = std::env::current_dir()?;
        let report = gather_versions(&cwd, &requests, reset)?;
        print_json(&report.to_json())
    }
}
