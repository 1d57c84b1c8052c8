//! CLI commands

mod bump;
mod completions;
mod gather;
mod graph;
mod init;
mod run;
mod synth;
mod validate;

use std::path::{Path, PathBuf};

use anyhow::Context;
use keelson_core::config::load_config_from_dir;
use keelson_monorepo::{from_config, Monorepo};

pub use bump::{BumpCommand, UnbumpCommand};
pub use completions::CompletionsCommand;
pub use gather::GatherVersionsCommand;
pub use graph::GraphCommand;
pub use init::InitCommand;
pub use run::RunCommand;
pub use synth::SynthCommand;
pub use validate::ValidateCommand;

/// Find the config above `cwd` and build the monorepo it describes.
///
/// Returns the monorepo and its root directory (where the config lives).
fn load_monorepo(cwd: &Path) -> anyhow::Result<(Monorepo, PathBuf)> {
    let (config, path) = load_config_from_dir(cwd)?;
    let root = path
        .parent()
        .map(Path::to_path_buf)
        .context("configuration file has no parent directory")?;
    let monorepo = from_config(&config)?;
    Ok((monorepo, root))
}
