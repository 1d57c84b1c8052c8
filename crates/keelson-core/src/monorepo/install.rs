//! Deferred dependency installation
//!
//! Packages never install on their own. Each one queues a resolver with the
//! coordinator, and the monorepo root flushes the queue once every manifest
//! has been written: one install, every resolver, and a second install only
//! if some resolver rewrote its manifest.

use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;

/// Runs the package manager install at the monorepo root
pub trait PackageInstaller {
    /// Install dependencies for the whole workspace rooted at `root`
    fn install(&self, root: &Path) -> Result<()>;
}

/// Post-install hook that pins a package's dependency ranges.
///
/// Returns `true` when it rewrote the package's manifest.
pub trait DependencyResolver {
    /// Re-derive dependency ranges now that `node_modules` exists
    fn resolve(&mut self, root: &Path) -> Result<bool>;
}

impl<F> DependencyResolver for F
where
    F: FnMut(&Path) -> Result<bool>,
{
    fn resolve(&mut self, root: &Path) -> Result<bool> {
        self(root)
    }
}

/// Where a package sends its install request
pub trait InstallDelegate {
    /// Queue `resolver` to run after the shared install
    fn request_install(&mut self, package: &str, resolver: Box<dyn DependencyResolver>);
}

/// Result of flushing the install queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// How many times the installer ran (0, 1 or 2)
    pub installs: usize,
    /// Packages whose resolver reported a change
    pub changed: Vec<String>,
}

/// Batches install requests from every package
#[derive(Default)]
pub struct InstallCoordinator {
    pending: Vec<(String, Box<dyn DependencyResolver>)>,
}

impl std::fmt::Debug for InstallCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallCoordinator")
            .field("pending", &self.pending.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish()
    }
}

impl InstallCoordinator {
    /// Create an empty coordinator
    pub fn new() -> Self {
        Self::default()
    }

    /// Packages with a queued request, in request order
    pub fn pending(&self) -> Vec<&str> {
        self.pending.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run the queued requests and clear the queue.
    ///
    /// Installs once, runs every resolver, then installs a second time if
    /// any resolver changed something. Resolvers never run twice. Any
    /// installer or resolver failure aborts the flush.
    pub fn flush(&mut self, installer: &dyn PackageInstaller, root: &Path) -> Result<FlushOutcome> {
        let mut pending = std::mem::take(&mut self.pending);
        let mut outcome = FlushOutcome::default();

        if pending.is_empty() {
            debug!("no install requests, skipping install");
            return Ok(outcome);
        }

        info!(requests = pending.len(), root = %root.display(), "installing dependencies");
        installer.install(root)?;
        outcome.installs += 1;

        for (package, resolver) in &mut pending {
            if resolver.resolve(root)? {
                debug!(package = %package, "resolver updated manifest");
                outcome.changed.push(package.clone());
            }
        }

        if !outcome.changed.is_empty() {
            info!(changed = outcome.changed.len(), "manifests changed, reinstalling");
            installer.install(root)?;
            outcome.installs += 1;
        }

        Ok(outcome)
    }
}

impl InstallDelegate for InstallCoordinator {
    fn request_install(&mut self, package: &str, resolver: Box<dyn DependencyResolver>) {
        debug!(package, "queued install request");
        self.pending.push((package.to_string(), resolver));
    }
}
