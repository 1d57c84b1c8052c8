//! Building a monorepo from a config file

use std::collections::HashMap;

use keelson_core::config::{package_directory, validate_config, Config, DependencySpec, PackageConfig};
use keelson_core::error::Result;
use keelson_core::monorepo::{ReleaseConfig, WorkspacePackage, WorkspaceReference};
use keelson_core::types::DependencyKind;
use tracing::{debug, info};

use crate::project::{Monorepo, MonorepoOptions};

impl From<&Config> for MonorepoOptions {
    fn from(config: &Config) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            repository: config.repository.clone(),
            default_release_branch: config.default_release_branch.clone(),
            package_manager: config.package_manager,
            github: config.github,
            dev_deps: config.dev_deps.clone(),
            release: config.release.enabled.then(|| config.release.clone()),
        }
    }
}

/// Build a monorepo from `config`.
///
/// Packages register in config order. A dependency naming another package
/// of the config becomes a workspace reference carrying that package's
/// visibility and the declared policy; every other name is external.
pub fn from_config(config: &Config) -> Result<Monorepo> {
    validate_config(config)?;
    let mut monorepo = Monorepo::new(MonorepoOptions::from(config))?;

    let references: HashMap<&str, WorkspaceReference> = config
        .packages
        .iter()
        .map(|p| {
            (
                p.name.as_str(),
                WorkspaceReference::new(&p.name, package_directory(p), p.private),
            )
        })
        .collect();

    for package in &config.packages {
        monorepo.add_workspace(workspace_package(package, &references))?;
    }
    info!(packages = config.packages.len(), "monorepo built from config");
    Ok(monorepo)
}

fn workspace_package(config: &PackageConfig, references: &HashMap<&str, WorkspaceReference>) -> WorkspacePackage {
    let mut package = WorkspacePackage::new(&config.name).with_directory(package_directory(config));
    package.private = config.private;
    package.description = config.description.clone();
    package.allow_private_deps = config.allow_private_deps;
    package.bundled_dependencies = config.bundled_deps.clone();
    package.release = config.release.clone().map(ReleaseConfig::from);
    package.manifest_overrides = config
        .manifest
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let sections: [(DependencyKind, &[DependencySpec]); 3] = [
        (DependencyKind::Runtime, &config.deps),
        (DependencyKind::Peer, &config.peer_deps),
        (DependencyKind::Dev, &config.dev_deps),
    ];
    for (kind, specs) in sections {
        for spec in specs {
            match references.get(spec.name()) {
                Some(reference) => {
                    let mut reference = reference.clone();
                    if let Some(policy) = spec.policy() {
                        reference = reference.with_policy(policy);
                    }
                    debug!(package = %config.name, dependency = %reference.name, %kind, "workspace dependency");
                    package = package.depends_on(reference, kind);
                }
                None => package = package.depends_on_external(spec.spec(), kind),
            }
        }
    }
    package
}
