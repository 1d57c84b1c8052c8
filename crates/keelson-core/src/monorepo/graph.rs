//! Workspace dependency graph

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::{debug, info, instrument, warn};

use crate::error::{GraphError, Result};
use crate::types::DependencyKind;

use super::package::{DependencyTarget, WorkspacePackage, WorkspaceReference};

/// All packages registered in a monorepo and the edges between them.
///
/// Only workspace edges participate in ordering and cycle detection;
/// external dependencies are ignored.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceGraph {
    /// Packages in registration order
    packages: Vec<WorkspacePackage>,
    /// Registration index by name
    index: HashMap<String, usize>,
}

impl WorkspaceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package.
    ///
    /// Fails on a duplicate name or directory, on a public package depending
    /// on a private sibling, and on a dependency cycle through the new
    /// package. A rejected package is not kept.
    #[instrument(skip(self, package), fields(package = %package.name))]
    pub fn register(&mut self, package: WorkspacePackage) -> Result<()> {
        if self.index.contains_key(&package.name) {
            return Err(GraphError::DuplicateName(package.name).into());
        }
        if let Some(existing) = self.packages.iter().find(|p| p.directory == package.directory) {
            return Err(GraphError::DuplicateDirectory {
                directory: package.directory.clone(),
                first: existing.name.clone(),
                second: package.name,
            }
            .into());
        }

        package.check_private_dependencies()?;
        self.check_known_visibility(&package)?;
        if let Some(release) = &package.release {
            release.validate(&package.name)?;
        }

        let name = package.name.clone();
        self.index.insert(name.clone(), self.packages.len());
        self.packages.push(package);

        if let Some(cycle) = self.find_cycle(&name) {
            self.unregister_last(&name);
            return Err(GraphError::Cycle(cycle.join(" -> ")).into());
        }

        // earlier packages may have referenced this one before it existed
        let mut earlier = Ok(());
        for dependent in self.dependents_of(&name, &[]) {
            earlier = self.check_known_visibility(dependent);
            if earlier.is_err() {
                break;
            }
        }
        if let Err(e) = earlier {
            self.unregister_last(&name);
            return Err(e);
        }

        info!(package = %name, total = self.packages.len(), "registered workspace package");
        Ok(())
    }

    fn unregister_last(&mut self, name: &str) {
        self.packages.pop();
        self.index.remove(name);
    }

    /// Re-check visibility against packages that are already registered, in
    /// case a hand-built reference disagrees with the real package
    fn check_known_visibility(&self, package: &WorkspacePackage) -> Result<()> {
        let mut corrected = package.clone();
        let mut changed = false;
        for dep in &mut corrected.dependencies {
            if let DependencyTarget::Workspace(reference) = &mut dep.target {
                if let Some(known) = self.get(&reference.name) {
                    if known.private != reference.private {
                        warn!(
                            package = %package.name,
                            dependency = %reference.name,
                            "workspace reference disagrees with registered package visibility"
                        );
                        reference.private = known.private;
                        changed = true;
                    }
                }
            }
        }
        if changed {
            corrected.check_private_dependencies()?;
        }
        Ok(())
    }

    /// Look up a package by name
    pub fn get(&self, name: &str) -> Option<&WorkspacePackage> {
        self.index.get(name).map(|&i| &self.packages[i])
    }

    /// Whether a package is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All packages, in registration order
    pub fn all_packages(&self) -> &[WorkspacePackage] {
        &self.packages
    }

    /// Number of registered packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no package is registered
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Distinct sibling references of a package, in declaration order
    pub fn workspace_dependencies(&self, name: &str) -> Result<Vec<&WorkspaceReference>> {
        let package = self
            .get(name)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))?;
        let mut seen = HashSet::new();
        Ok(package
            .workspace_dependencies()
            .filter(|(r, _)| seen.insert(r.name.as_str()))
            .map(|(r, _)| r)
            .collect())
    }

    /// Packages depending directly on `name` through any of `kinds`
    /// (all kinds when empty), in registration order
    pub fn dependents_of(&self, name: &str, kinds: &[DependencyKind]) -> Vec<&WorkspacePackage> {
        self.packages
            .iter()
            .filter(|p| {
                p.workspace_dependencies()
                    .any(|(r, kind)| r.name == name && (kinds.is_empty() || kinds.contains(&kind)))
            })
            .collect()
    }

    /// Every package that depends on `name`, directly or transitively
    pub fn transitive_dependents(&self, name: &str) -> Vec<&WorkspacePackage> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(current, &[]) {
                if dependent.name != name && seen.insert(&dependent.name) {
                    queue.push_back(&dependent.name);
                }
            }
        }

        self.packages
            .iter()
            .filter(|p| seen.contains(p.name.as_str()))
            .collect()
    }

    /// Every registered package `name` depends on, directly or transitively
    pub fn transitive_dependencies(&self, name: &str) -> Vec<&WorkspacePackage> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            let Some(package) = self.get(current) else {
                continue;
            };
            for (reference, _) in package.workspace_dependencies() {
                if reference.name != name
                    && self.contains(&reference.name)
                    && seen.insert(&reference.name)
                {
                    queue.push_back(&reference.name);
                }
            }
        }

        self.packages
            .iter()
            .filter(|p| seen.contains(p.name.as_str()))
            .collect()
    }

    /// Fail if any edge names a package that was never registered, or
    /// names a private package the dependent may not use
    pub fn check_references(&self) -> Result<()> {
        for package in &self.packages {
            self.check_known_visibility(package)?;
            for (reference, _) in package.workspace_dependencies() {
                if !self.contains(&reference.name) {
                    return Err(GraphError::UnknownWorkspace {
                        package: package.name.clone(),
                        dependency: reference.name.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Packages ordered so every package follows all of its workspace
    /// dependencies. Ties are broken by registration order.
    #[instrument(skip(self))]
    pub fn topological_order(&self) -> Result<Vec<&WorkspacePackage>> {
        self.check_references()?;

        let count = self.packages.len();
        let mut in_degree = vec![0usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (i, package) in self.packages.iter().enumerate() {
            let deps: BTreeSet<usize> = package
                .workspace_dependencies()
                .filter_map(|(r, _)| self.index.get(&r.name).copied())
                .collect();
            in_degree[i] = deps.len();
            for dep in deps {
                dependents[dep].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut sorted = Vec::with_capacity(count);

        while let Some(next) = ready.pop_first() {
            sorted.push(&self.packages[next]);
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if sorted.len() != count {
            let start = (0..count)
                .find(|&i| in_degree[i] > 0)
                .map(|i| self.packages[i].name.clone())
                .unwrap_or_default();
            let cycle = self
                .find_cycle(&start)
                .map(|c| c.join(" -> "))
                .unwrap_or(start);
            return Err(GraphError::Cycle(cycle).into());
        }

        debug!(order = ?sorted.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), "topological order");
        Ok(sorted)
    }

    /// Find a cycle through `start` using DFS; returns the path with `start`
    /// repeated at the end
    fn find_cycle(&self, start: &str) -> Option<Vec<String>> {
        let mut path = vec![start.to_string()];
        let mut visited = HashSet::new();
        if self.cycle_dfs(start, start, &mut path, &mut visited) {
            Some(path)
        } else {
            None
        }
    }

    fn cycle_dfs(
        &self,
        current: &str,
        target: &str,
        path: &mut Vec<String>,
        visited: &mut HashSet<String>,
    ) -> bool {
        let Some(package) = self.get(current) else {
            return false;
        };

        let mut seen_here = HashSet::new();
        for (reference, _) in package.workspace_dependencies() {
            if !seen_here.insert(reference.name.as_str()) {
                continue;
            }
            if reference.name == target {
                path.push(target.to_string());
                return true;
            }
            if self.contains(&reference.name) && visited.insert(reference.name.clone()) {
                path.push(reference.name.clone());
                if self.cycle_dfs(&reference.name, target, path, visited) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }
}
