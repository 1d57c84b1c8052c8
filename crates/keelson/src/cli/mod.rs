//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{
    BumpCommand, CompletionsCommand, GatherVersionsCommand, GraphCommand, InitCommand, RunCommand,
    SynthCommand, UnbumpCommand, ValidateCommand,
};

/// Keelson - build and release configuration for Yarn workspaces monorepos
#[derive(Debug, Parser)]
#[command(name = "keelson")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate manifests, task files and the release workflow
    Synth(SynthCommand),

    /// Pin sibling dependency ranges to the installed versions
    #[command(disable_help_flag = true)]
    GatherVersions(GatherVersionsCommand),

    /// Compute the next version from the commit history
    Bump(BumpCommand),

    /// Restore the development version
    Unbump(UnbumpCommand),

    /// Run a task from .keelson/tasks.json
    Run(RunCommand),

    /// Show the workspace dependency graph
    Graph(GraphCommand),

    /// Validate the configuration and workspace graph
    Validate(ValidateCommand),

    /// Initialize a new Keelson configuration
    Init(InitCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            Commands::Synth(cmd) => cmd.execute(self),
            Commands::GatherVersions(cmd) => cmd.execute(self),
            Commands::Bump(cmd) => cmd.execute(self),
            Commands::Unbump(cmd) => cmd.execute(self),
            Commands::Run(cmd) => cmd.execute(self),
            Commands::Graph(cmd) => cmd.execute(self),
            Commands::Validate(cmd) => cmd.execute(self),
            Commands::Init(cmd) => cmd.execute(self),
            Commands::Completions(cmd) => cmd.execute(self),
        }
    }
}
