//! Terminal output shared by the commands
//!
//! Every command either prints one JSON document (`--format json`) or a
//! styled text report, which `--quiet` suppresses. Errors always go to
//! stderr.

use std::fmt::Display;
use std::path::Path;

use console::{style, Style};
use serde_json::Value;

use super::{Cli, OutputFormat};

/// Print a failed command's error with its cause chain
pub fn error(err: &anyhow::Error) {
    eprintln!("{} {}", style("✗").red().bold(), err);
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", style("caused by:").dim(), cause);
    }
}

/// Writes a command's result in the format the user picked
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
    quiet: bool,
}

impl Printer {
    /// Printer for the global flags of `cli`
    pub fn new(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            quiet: cli.quiet,
        }
    }

    /// Whether text lines are printed at all
    pub fn shows_text(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }

    /// Print `doc` in JSON mode, otherwise run `text` unless quiet
    pub fn report(&self, doc: Value, text: impl FnOnce(&Self)) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => print_json(&doc),
            OutputFormat::Text => {
                if !self.quiet {
                    text(self);
                }
                Ok(())
            }
        }
    }

    /// `✓ message`
    pub fn done(&self, message: impl Display) {
        if self.shows_text() {
            println!("{} {}", style("✓").green().bold(), message);
        }
    }

    /// `→ message`
    pub fn note(&self, message: impl Display) {
        if self.shows_text() {
            println!("{} {}", style("→").blue(), message);
        }
    }

    /// Bold section title
    pub fn heading(&self, title: impl Display) {
        if self.shows_text() {
            println!("{}", style(title).bold());
        }
    }

    /// Indented `key: value` line
    pub fn field(&self, key: &str, value: impl Display) {
        if self.shows_text() {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    /// Indented list of generated files
    pub fn files<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) {
        if self.shows_text() {
            for path in paths {
                println!("  {}", path_style().apply_to(path.display()));
            }
        }
    }
}

/// Pretty JSON on stdout
pub fn print_json(doc: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(doc)?);
    Ok(())
}

/// Style for file paths and package directories
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Style for released versions
pub fn version_style() -> Style {
    Style::new().green().bold()
}
