//! Synthesis output

use std::path::{Path, PathBuf};

use keelson_core::error::Result;
use keelson_core::monorepo::FlushOutcome;
use tracing::debug;

/// A generated file, path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthFile {
    /// Path relative to the output directory
    pub path: PathBuf,
    /// Full file content
    pub content: String,
}

impl SynthFile {
    /// Create a file entry
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Everything one synthesis pass would write
#[derive(Debug, Clone, Default)]
pub struct SynthPlan {
    /// Files in write order
    pub files: Vec<SynthFile>,
    /// Package directories in topological order
    pub packages: Vec<String>,
    /// Release workflow file name, when one is generated
    pub workflow: Option<String>,
}

impl SynthPlan {
    /// Look up a planned file by relative path
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&SynthFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }

    /// Write every file under `outdir`, returning the absolute paths
    pub fn write(&self, outdir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = outdir.join(&file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &file.content)?;
            debug!(path = %path.display(), "wrote file");
            written.push(path);
        }
        Ok(written)
    }
}

/// What a synthesis pass did
#[derive(Debug, Clone, Default)]
pub struct SynthReport {
    /// Files written
    pub files: Vec<PathBuf>,
    /// Package directories in topological order
    pub packages: Vec<String>,
    /// Release workflow file name, when one was generated
    pub workflow: Option<String>,
    /// Result of the deferred install, when it ran
    pub install: Option<FlushOutcome>,
}
