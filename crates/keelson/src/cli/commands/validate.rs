//! Validate command

use clap::Args;
use console::style;
use serde_json::json;
use tracing::info;

use keelson_core::config::load_config_from_dir;
use keelson_monorepo::from_config;

use crate::cli::output::{path_style, Printer};
use crate::cli::Cli;
use crate::exit_codes::ValidationFailed;

/// Validate the configuration and workspace graph
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Only validate the configuration file
    #[arg(long)]
    pub config_only: bool,

    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            config_only = self.config_only,
            strict = self.strict,
            "executing validate command"
        );
        let cwd = std::env::current_dir()?;

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let (config, config_path) = match load_config_from_dir(&cwd) {
            Ok((c, p)) => (Some(c), Some(p)),
            Err(e) => {
                errors.push(format!("Configuration: {}", e));
                (None, None)
            }
        };

        if let (Some(cfg), Some(path)) = (&config, &config_path) {
            if cfg.packages.is_empty() {
                warnings.push("No workspace packages configured".to_string());
            }

            if !self.config_only {
                match from_config(cfg) {
                    Ok(monorepo) => {
                        let root = path.parent().unwrap_or(&cwd);
                        if let Err(e) = monorepo.plan(root) {
                            errors.push(format!("Synthesis: {}", e));
                        }
                    }
                    Err(e) => errors.push(format!("Workspace: {}", e)),
                }

                let binary = cfg.package_manager.binary();
                if which::which(binary).is_err() {
                    warnings.push(format!("'{}' not found on PATH; synth cannot install dependencies", binary));
                }
            }
        }

        if self.strict {
            errors.append(&mut warnings);
        }

        let passed = errors.is_empty();

        Printer::new(cli).report(
            json!({
                "valid": passed,
                "config_path": config_path.as_ref().map(|p| p.display().to_string()),
                "errors": errors,
                "warnings": warnings,
            }),
            |out| {
                out.heading("Validation results");
                if let Some(path) = &config_path {
                    out.field("config", path_style().apply_to(path.display()));
                }
                for error in &errors {
                    println!("  {} {}", style("✗").red(), error);
                }
                for warning in &warnings {
                    println!("  {} {}", style("!").yellow(), warning);
                }
                if passed {
                    out.done("All checks passed");
                }
            },
        )?;

        if passed {
            Ok(())
        } else {
            Err(ValidationFailed(errors.len()).into())
        }
    }
}
