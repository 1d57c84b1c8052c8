//! Manifest rendering
//!
//! Dependencies without a declared range are rendered as `*`. The install
//! pass pins them, and a pin found in the manifest already on disk is kept
//! so repeated synthesis is stable. Release-time ranges left behind by an
//! interrupted release are dropped.

use keelson_adapters::PackageJson;
use keelson_core::config::{deep_merge, split_spec};
use keelson_core::error::Result;
use keelson_core::monorepo::{DependencyTarget, WorkspaceGraph, WorkspacePackage};
use keelson_core::types::DependencyKind;
use keelson_release::bump::DEVELOPMENT_VERSION;
use keelson_tasks::{workspaces_section, TaskSet};
use semver::Version;
use serde_json::{json, Map, Value};

const WILDCARD: &str = "*";

/// `scripts` entries that forward to `keelson run`
pub fn scripts(tasks: &TaskSet) -> Value {
    let scripts: Map<String, Value> = tasks
        .names()
        .map(|name| (name.to_string(), json!(format!("keelson run {}", name))))
        .collect();
    Value::Object(scripts)
}

/// Whether `range` is what the install pass writes for a dependency.
///
/// Siblings always install at the development version, so their only pin is
/// `^0.0.0`. Registry packages pin to `^<installed version>`.
pub fn is_install_pin(range: &str, sibling: bool) -> bool {
    let Some(version) = range.strip_prefix('^') else {
        return false;
    };
    if sibling {
        version == DEVELOPMENT_VERSION
    } else {
        Version::parse(version).is_ok()
    }
}

/// Range written for a dependency.
///
/// A declared range always wins. Without one, an install pin from the
/// existing manifest is kept, otherwise `*`.
pub fn dependency_range(
    name: &str,
    declared: Option<&str>,
    kind: DependencyKind,
    sibling: bool,
    existing: Option<&PackageJson>,
) -> String {
    if let Some(range) = declared {
        return range.to_string();
    }
    existing
        .and_then(|manifest| manifest.range(kind, name))
        .filter(|range| is_install_pin(range, sibling))
        .unwrap_or(WILDCARD)
        .to_string()
}

fn repository(url: &str, directory: Option<&str>) -> Value {
    let mut repository = Map::new();
    repository.insert("type".to_string(), json!("git"));
    repository.insert("url".to_string(), json!(url));
    if let Some(directory) = directory {
        repository.insert("directory".to_string(), json!(directory));
    }
    Value::Object(repository)
}

fn dependency_sections(package: &WorkspacePackage, existing: Option<&PackageJson>) -> Map<String, Value> {
    let mut sections: Map<String, Value> = Map::new();

    let mut insert = |kind: DependencyKind, name: &str, declared: Option<&str>, sibling: bool| {
        let range = dependency_range(name, declared, kind, sibling, existing);
        let section = sections
            .entry(kind.manifest_section())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(section) = section {
            section.insert(name.to_string(), json!(range));
        }
    };

    for kind in DependencyKind::ALL {
        for dep in package.dependencies.iter().filter(|d| d.kind == kind) {
            match &dep.target {
                DependencyTarget::Workspace(reference) => insert(kind, &reference.name, None, true),
                DependencyTarget::External { name, range } => insert(kind, name, range.as_deref(), false),
            }
        }
        if kind == DependencyKind::Runtime {
            for spec in &package.bundled_dependencies {
                let (name, range) = split_spec(spec);
                insert(kind, name, range, false);
            }
        }
    }
    sections
}

/// Render the manifest of a workspace package
pub fn package_manifest(
    package: &WorkspacePackage,
    tasks: &TaskSet,
    repository_url: Option<&str>,
    existing: Option<&PackageJson>,
) -> Value {
    let mut doc = Map::new();
    doc.insert("name".to_string(), json!(package.name));
    if let Some(description) = &package.description {
        doc.insert("description".to_string(), json!(description));
    }
    doc.insert("version".to_string(), json!(DEVELOPMENT_VERSION));
    if package.private {
        doc.insert("private".to_string(), json!(true));
    }
    if let Some(url) = repository_url {
        doc.insert("repository".to_string(), repository(url, Some(&package.directory)));
    }
    doc.insert("main".to_string(), json!("lib/index.js"));
    doc.insert("types".to_string(), json!("lib/index.d.ts"));
    doc.insert("scripts".to_string(), scripts(tasks));
    doc.extend(dependency_sections(package, existing));

    let bundled: Vec<&str> = package.bundled_names().collect();
    if !bundled.is_empty() {
        doc.insert("bundledDependencies".to_string(), json!(bundled));
    }

    let mut doc = Value::Object(doc);
    if !package.manifest_overrides.is_empty() {
        deep_merge(&mut doc, &Value::Object(package.manifest_overrides.clone()));
    }
    doc
}

/// Fields of the root manifest
#[derive(Debug, Clone, Copy)]
pub struct RootManifest<'a> {
    /// Root package name
    pub name: &'a str,
    /// Root package description
    pub description: Option<&'a str>,
    /// Repository URL
    pub repository: Option<&'a str>,
    /// Root development dependencies, `name[@range]`
    pub dev_deps: &'a [String],
}

impl RootManifest<'_> {
    /// Render the root manifest with the workspace list in build order
    pub fn render(&self, tasks: &TaskSet, graph: &WorkspaceGraph, existing: Option<&PackageJson>) -> Result<Value> {
        let mut doc = Map::new();
        doc.insert("name".to_string(), json!(self.name));
        if let Some(description) = self.description {
            doc.insert("description".to_string(), json!(description));
        }
        doc.insert("private".to_string(), json!(true));
        if let Some(url) = self.repository {
            doc.insert("repository".to_string(), repository(url, None));
        }
        doc.insert("scripts".to_string(), scripts(tasks));

        if !self.dev_deps.is_empty() {
            let dev: Map<String, Value> = self
                .dev_deps
                .iter()
                .map(|spec| {
                    let (name, declared) = split_spec(spec);
                    let range = dependency_range(name, declared, DependencyKind::Dev, false, existing);
                    (name.to_string(), json!(range))
                })
                .collect();
            doc.insert("devDependencies".to_string(), Value::Object(dev));
        }

        let workspaces = workspaces_section(graph)?;
        let projects: Vec<String> = workspaces["packages"]
            .as_array()
            .map(|dirs| {
                dirs.iter()
                    .filter_map(Value::as_str)
                    .map(|dir| format!("<rootDir>/{}", dir))
                    .collect()
            })
            .unwrap_or_default();
        doc.insert("workspaces".to_string(), workspaces);
        doc.insert("jest".to_string(), json!({ "projects": projects }));

        Ok(Value::Object(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_tasks::Task;

    fn tasks() -> TaskSet {
        let mut tasks = TaskSet::new();
        tasks.add(Task::new("build"));
        tasks.add(Task::new("test"));
        tasks
    }

    #[test]
    fn test_package_manifest_fields() {
        let sibling = WorkspacePackage::new("@acme/base");
        let pkg = WorkspacePackage::new("@acme/app")
            .with_description("The app")
            .depends_on(sibling.reference(), DependencyKind::Runtime)
            .depends_on_external("lodash@^4.17.0", DependencyKind::Runtime)
            .depends_on_external("typescript", DependencyKind::Dev)
            .bundles("left-pad@^1.3.0");

        let doc = package_manifest(&pkg, &tasks(), Some("https://github.com/acme/repo"), None);

        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "description",
                "version",
                "repository",
                "main",
                "types",
                "scripts",
                "dependencies",
                "devDependencies",
                "bundledDependencies",
            ]
        );
        assert_eq!(doc["version"], "0.0.0");
        assert_eq!(doc["repository"]["directory"], "packages/@acme/app");
        assert_eq!(doc["scripts"]["build"], "keelson run build");
        assert_eq!(
            doc["dependencies"],
            json!({"@acme/base": "*", "lodash": "^4.17.0", "left-pad": "^1.3.0"})
        );
        assert_eq!(doc["devDependencies"], json!({"typescript": "*"}));
        assert_eq!(doc["bundledDependencies"], json!(["left-pad"]));
        assert!(doc.get("private").is_none());
    }

    #[test]
    fn test_existing_concrete_range_is_kept() {
        let sibling = WorkspacePackage::new("base");
        let pkg = WorkspacePackage::new("app")
            .depends_on(sibling.reference(), DependencyKind::Runtime)
            .depends_on_external("chalk", DependencyKind::Runtime);
        let existing = PackageJson::from_map(
            json!({"dependencies": {"base": "^0.0.0", "chalk": "*"}})
                .as_object()
                .cloned()
                .unwrap(),
        );

        let doc = package_manifest(&pkg, &tasks(), None, Some(&existing));
        assert_eq!(doc["dependencies"], json!({"base": "^0.0.0", "chalk": "*"}));
        assert!(doc.get("repository").is_none());
    }

    #[test]
    fn test_leftover_release_ranges_are_dropped() {
        let sibling = WorkspacePackage::new("base");
        let pkg = WorkspacePackage::new("app")
            .depends_on(sibling.reference(), DependencyKind::Runtime)
            .depends_on(WorkspacePackage::new("testing").reference(), DependencyKind::Dev)
            .depends_on_external("chalk", DependencyKind::Runtime)
            .depends_on_external("semver", DependencyKind::Runtime);
        // what gather-versions leaves when unbump never ran
        let existing = PackageJson::from_map(
            json!({
                "dependencies": {"base": "^2.4.1", "chalk": "^5.3.0", "semver": ">=7"},
                "devDependencies": {"testing": "1.0.3"}
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        let doc = package_manifest(&pkg, &tasks(), None, Some(&existing));
        assert_eq!(
            doc["dependencies"],
            json!({"base": "*", "chalk": "^5.3.0", "semver": "*"})
        );
        assert_eq!(doc["devDependencies"], json!({"testing": "*"}));
    }

    #[test]
    fn test_install_pins() {
        assert!(is_install_pin("^0.0.0", true));
        assert!(!is_install_pin("^1.2.3", true));
        assert!(!is_install_pin("0.0.0", true));
        assert!(is_install_pin("^1.2.3", false));
        assert!(is_install_pin("^1.0.0-rc.1", false));
        assert!(!is_install_pin("~1.2", false));
        assert!(!is_install_pin("*", false));
    }

    #[test]
    fn test_overrides_merge_last() {
        let mut pkg = WorkspacePackage::new("app").private();
        pkg.manifest_overrides = json!({"main": "dist/index.js", "types": null, "publishConfig": {"access": "public"}})
            .as_object()
            .cloned()
            .unwrap();

        let doc = package_manifest(&pkg, &tasks(), None, None);
        assert_eq!(doc["private"], true);
        assert_eq!(doc["main"], "dist/index.js");
        assert!(doc.get("types").is_none());
        assert_eq!(doc["publishConfig"]["access"], "public");
    }

    #[test]
    fn test_root_manifest() {
        let mut graph = WorkspaceGraph::new();
        let base = WorkspacePackage::new("base");
        graph
            .register(WorkspacePackage::new("app").depends_on(base.reference(), DependencyKind::Runtime))
            .unwrap();
        graph.register(base).unwrap();

        let dev_deps = vec!["shx".to_string(), "typescript@~5.4.0".to_string()];
        let root = RootManifest {
            name: "acme-monorepo",
            description: None,
            repository: Some("https://github.com/acme/repo"),
            dev_deps: &dev_deps,
        };
        let doc = root.render(&tasks(), &graph, None).unwrap();

        assert_eq!(doc["private"], true);
        assert!(doc["repository"].get("directory").is_none());
        assert_eq!(doc["devDependencies"], json!({"shx": "*", "typescript": "~5.4.0"}));
        assert_eq!(doc["workspaces"], json!({"packages": ["packages/base", "packages/app"]}));
        assert_eq!(
            doc["jest"]["projects"],
            json!(["<rootDir>/packages/base", "<rootDir>/packages/app"])
        );
    }
}
