//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = parse_config(&content, format == "TOML")?;

    validate_config(&config)?;
    debug!(path = %path.display(), packages = config.packages.len(), "config loaded and validated");
    Ok(config)
}

fn parse_config(content: &str, is_toml: bool) -> Result<Config> {
    let config = if is_toml {
        toml::from_str(content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(content).map_err(ConfigError::YamlError)?
    };
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// The first name from [`config_file_names`] present in the nearest
/// directory wins.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("keelson.yaml");
        std::fs::write(&config_path, "name: repo\n").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_yaml_over_toml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("keelson.toml");
        let yaml_path = temp.path().join("keelson.yaml");
        std::fs::write(&toml_path, "name = \"repo\"").unwrap();
        std::fs::write(&yaml_path, "name: repo").unwrap();

        assert_eq!(find_config(temp.path()).unwrap(), yaml_path);
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(".keelson.toml");
        std::fs::write(&config_path, "name = \"repo\"").unwrap();
        let nested = temp.path().join("packages").join("one");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested).unwrap(), config_path);
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("keelson.yaml");
        std::fs::write(
            &config_path,
            r#"
name: repo
release:
  enabled: true
packages:
  - name: one
  - name: two
    deps:
      - name: one
        policy: exact
    bundled_deps:
      - dep-a
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.name, "repo");
        assert!(config.release.enabled);
        assert_eq!(config.packages.len(), 2);
        assert_eq!(config.packages[1].bundled_deps, vec!["dep-a"]);
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("keelson.toml");
        std::fs::write(
            &config_path,
            r#"
name = "repo"
default_release_branch = "v2"

[[packages]]
name = "one"
private = true
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.default_release_branch, "v2");
        assert!(config.packages[0].private);
    }

    #[test]
    fn test_load_config_missing() {
        let temp = TempDir::new().unwrap();
        let err = load_config_from_dir(temp.path()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("keelson.yaml");
        std::fs::write(&config_path, "name: repo\npackages:\n  - name: one\n  - name: one\n").unwrap();
        assert!(load_config(&config_path).is_err());
    }
}
