//! Default configuration values

use super::types::Config;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "keelson.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "keelson.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".keelson.yaml";

/// Directory holding generated task definitions
pub const KEELSON_DIR: &str = ".keelson";

/// Task definitions file, relative to a project directory
pub const TASKS_FILE: &str = ".keelson/tasks.json";

/// Default workspace scope directory
pub const DEFAULT_SCOPE: &str = "packages";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        DEFAULT_CONFIG_TOML,
        ALT_CONFIG_FILE,
        ".keelson.toml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    let config = Config::default();
    serde_yaml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Keelson Configuration

name: monorepo
default_release_branch: main
github: true

release:
  enabled: true
  runs_on:
    - ubuntu-latest
  node_version: "lts/*"

packages:
  - name: core
  - name: cli
    deps:
      - name: core
        policy: future-minor
"#;
