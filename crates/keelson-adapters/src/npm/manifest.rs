//! npm package.json handling
//!
//! The manifest is kept as a raw JSON document so that rewriting a few
//! ranges leaves every other field, and the key order, untouched.

use std::path::{Path, PathBuf};

use keelson_core::error::{AdapterError, Result};
use keelson_core::types::DependencyKind;
use serde_json::{Map, Value};

/// Manifest file name
pub const MANIFEST_FILE: &str = "package.json";

/// A package.json document
#[derive(Debug, Clone, PartialEq)]
pub struct PackageJson {
    doc: Map<String, Value>,
}

impl PackageJson {
    /// Wrap an existing JSON object
    pub fn from_map(doc: Map<String, Value>) -> Self {
        Self { doc }
    }

    /// Parse manifest text; `path` is used for error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| AdapterError::ManifestParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        match value {
            Value::Object(doc) => Ok(Self { doc }),
            _ => Err(AdapterError::ManifestParseError {
                path: path.to_path_buf(),
                reason: "top-level value is not an object".to_string(),
            }
            .into()),
        }
    }

    /// Load package.json from path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| AdapterError::ManifestNotFound(path.to_path_buf()))?;
        Self::parse(&content, path)
    }

    /// Load `<dir>/package.json`
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(MANIFEST_FILE))
    }

    /// Load `<dir>/package.json` if it exists and parses
    pub fn try_load_from_dir(dir: &Path) -> Option<Self> {
        Self::load_from_dir(dir).ok()
    }

    /// Render as 2-space-indented JSON with a trailing newline
    pub fn to_string_pretty(&self) -> Result<String> {
        let content = serde_json::to_string_pretty(&self.doc)
            .map_err(|e| AdapterError::ManifestUpdateError(e.to_string()))?;
        Ok(format!("{}\n", content))
    }

    /// Save package.json to path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_string_pretty()?;
        std::fs::write(path, content)
            .map_err(|e| AdapterError::ManifestUpdateError(format!("{}: {}", path.display(), e)).into())
    }

    /// The underlying document
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.doc
    }

    /// Consume into the underlying document
    pub fn into_map(self) -> Map<String, Value> {
        self.doc
    }

    /// Package name
    pub fn name(&self) -> Option<&str> {
        self.doc.get("name").and_then(Value::as_str)
    }

    /// Package version
    pub fn version(&self) -> Option<&str> {
        self.doc.get("version").and_then(Value::as_str)
    }

    /// Set the package version
    pub fn set_version(&mut self, version: &str) {
        self.doc
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Whether the package is marked private
    pub fn is_private(&self) -> bool {
        self.doc.get("private").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Dependency section for `kind`
    pub fn section(&self, kind: DependencyKind) -> Option<&Map<String, Value>> {
        self.doc.get(kind.manifest_section()).and_then(Value::as_object)
    }

    /// Declared range of `name` in the section for `kind`
    pub fn range(&self, kind: DependencyKind, name: &str) -> Option<&str> {
        self.section(kind)?.get(name)?.as_str()
    }

    /// Replace the range of a dependency that is already declared.
    ///
    /// Returns `true` when the dependency was present, whether or not the
    /// range actually differed. Never adds a dependency.
    pub fn replace_range(&mut self, kind: DependencyKind, name: &str, range: &str) -> bool {
        let Some(section) = self
            .doc
            .get_mut(kind.manifest_section())
            .and_then(Value::as_object_mut)
        else {
            return false;
        };
        match section.get_mut(name) {
            Some(slot) => {
                *slot = Value::String(range.to_string());
                true
            }
            None => false,
        }
    }

    /// Dependencies of `kind` declared with the wildcard range `*`
    pub fn wildcard_dependencies(&self, kind: DependencyKind) -> Vec<String> {
        self.section(kind)
            .map(|section| {
                section
                    .iter()
                    .filter(|(_, range)| range.as_str() == Some("*"))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Path of `<dir>/package.json`
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        std::fs::write(&path, r#"{"name": "test", "version": "1.0.0"}"#).unwrap();

        let pkg = PackageJson::load(&path).unwrap();
        assert_eq!(pkg.name(), Some("test"));
        assert_eq!(pkg.version(), Some("1.0.0"));
        assert!(!pkg.is_private());
    }

    #[test]
    fn test_missing_and_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        assert!(PackageJson::load(&path).is_err());

        std::fs::write(&path, "[1, 2]").unwrap();
        let err = PackageJson::load(&path).unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn test_replace_range_never_adds() {
        let mut pkg = PackageJson::parse(
            r#"{"name": "x", "dependencies": {"a": "*"}}"#,
            Path::new("package.json"),
        )
        .unwrap();

        assert!(pkg.replace_range(DependencyKind::Runtime, "a", "^1.0.0"));
        assert!(!pkg.replace_range(DependencyKind::Runtime, "b", "^1.0.0"));
        assert!(!pkg.replace_range(DependencyKind::Dev, "a", "1.0.0"));
        assert_eq!(pkg.range(DependencyKind::Runtime, "a"), Some("^1.0.0"));
        assert!(pkg.section(DependencyKind::Dev).is_none());
    }

    #[test]
    fn test_save_preserves_order_and_newline() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"version": "1.0.0", "name": "test", "customField": "value"}"#,
        )
        .unwrap();

        let mut pkg = PackageJson::load(&path).unwrap();
        pkg.set_version("2.0.0");
        pkg.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\n  \"version\": \"2.0.0\",\n  \"name\": \"test\",\n  \"customField\": \"value\"\n}\n"
        );
    }

    #[test]
    fn test_wildcard_dependencies() {
        let pkg = PackageJson::parse(
            r#"{"devDependencies": {"a": "*", "b": "^1", "c": "*"}}"#,
            Path::new("package.json"),
        )
        .unwrap();
        assert_eq!(pkg.wildcard_dependencies(DependencyKind::Dev), vec!["a", "c"]);
        assert!(pkg.wildcard_dependencies(DependencyKind::Peer).is_empty());
    }
}
