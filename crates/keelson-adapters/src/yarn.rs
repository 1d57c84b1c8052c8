//! Yarn classic installer

use std::path::Path;
use std::process::Command;

use keelson_core::error::{AdapterError, Result};
use keelson_core::monorepo::PackageInstaller;
use keelson_core::types::PackageManager;
use tracing::{debug, info, instrument};

/// Runs `yarn install --check-files` at the monorepo root
#[derive(Debug, Clone)]
pub struct YarnInstaller {
    manager: PackageManager,
}

impl YarnInstaller {
    /// Create an installer for Yarn classic
    pub fn new() -> Self {
        Self {
            manager: PackageManager::YarnClassic,
        }
    }

    /// The full install command line
    pub fn command_line(&self) -> String {
        format!("{} {}", self.manager.binary(), self.manager.install_args().join(" "))
    }
}

impl Default for YarnInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageInstaller for YarnInstaller {
    #[instrument(skip(self), fields(root = %root.display()))]
    fn install(&self, root: &Path) -> Result<()> {
        let binary = which::which(self.manager.binary())
            .map_err(|_| AdapterError::ToolNotFound(self.manager.binary().to_string()))?;
        debug!(binary = %binary.display(), "using package manager");

        info!(command = %self.command_line(), "installing dependencies");
        let output = Command::new(&binary)
            .args(self.manager.install_args())
            .current_dir(root)
            .output()
            .map_err(|e| AdapterError::CommandFailed {
                command: self.command_line(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::CommandFailed {
                command: self.command_line(),
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        Ok(())
    }
}
