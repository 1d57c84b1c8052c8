//! Init command

use std::path::PathBuf;

use clap::Args;
use console::style;
use dialoguer::Confirm;
use tracing::info;

use keelson_core::config::defaults::{DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};
use keelson_core::config::Config;

use crate::cli::Cli;

/// Initialize a new Keelson configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Use defaults without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Write TOML instead of YAML
    #[arg(long)]
    pub toml: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, yes = self.yes, toml = self.toml, "executing init command");
        let cwd = std::env::current_dir()?;
        let default_name = if self.toml { DEFAULT_CONFIG_TOML } else { DEFAULT_CONFIG_YAML };
        let config_path = self.output.clone().unwrap_or_else(|| cwd.join(default_name));

        if config_path.exists() && !self.force {
            if self.yes {
                anyhow::bail!(
                    "Configuration file already exists at {}. Use --force to overwrite.",
                    config_path.display()
                );
            }

            let overwrite = Confirm::new()
                .with_prompt(format!(
                    "Configuration file already exists at {}. Overwrite?",
                    config_path.display()
                ))
                .default(false)
                .interact()?;

            if !overwrite {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        std::fs::write(&config_path, render_template(self.toml)?)?;

        if !cli.quiet {
            println!(
                "{} Created configuration at {}",
                style("✓").green().bold(),
                style(config_path.display()).cyan()
            );
            println!();
            println!("Next steps:");
            println!("  1. Edit {} to list your workspace packages", config_path.display());
            println!("  2. Run {} to check the workspace graph", style("keelson validate").cyan());
            println!("  3. Run {} to generate the project files", style("keelson synth").cyan());
        }

        Ok(())
    }
}

/// The starter configuration in the requested format
fn render_template(toml: bool) -> anyhow::Result<String> {
    if !toml {
        return Ok(DEFAULT_CONFIG_TEMPLATE.to_string());
    }
    let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE)?;
    Ok(toml::to_string_pretty(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse_back() {
        let yaml: Config = serde_yaml::from_str(&render_template(false).unwrap()).unwrap();
        let toml: Config = toml::from_str(&render_template(true).unwrap()).unwrap();
        assert_eq!(yaml.packages.len(), toml.packages.len());
        assert_eq!(toml.packages[1].deps[0].name(), "core");
        assert!(toml.release.enabled);
    }
}
