//! Configuration validation

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::defaults::DEFAULT_SCOPE;
use super::types::{Config, PackageConfig, ReleaseTrigger};

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[a-z0-9][a-z0-9._~-]*/)?[a-z0-9][a-z0-9._~-]*$")
        .expect("package name pattern is valid")
});

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_root(config)?;
    validate_release(config)?;
    validate_packages(config)?;
    debug!("configuration validation passed");
    Ok(())
}

/// Whether `name` is a valid npm package name
pub fn is_valid_package_name(name: &str) -> bool {
    name.len() <= 214 && PACKAGE_NAME.is_match(name)
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_root(config: &Config) -> Result<()> {
    if !is_valid_package_name(&config.name) {
        return Err(invalid("name", format!("'{}' is not a valid package name", config.name)).into());
    }

    if config.default_release_branch.trim().is_empty()
        || config.default_release_branch.contains(char::is_whitespace)
    {
        return Err(invalid(
            "default_release_branch",
            "branch name cannot be empty or contain whitespace",
        )
        .into());
    }

    if let Some(repository) = &config.repository {
        url::Url::parse(repository)
            .map_err(|e| invalid("repository", format!("invalid URL '{}': {}", repository, e)))?;
    }

    Ok(())
}

fn validate_release(config: &Config) -> Result<()> {
    if !config.release.enabled {
        return Ok(());
    }

    if config.release.runs_on.is_empty() {
        return Err(invalid("release.runs_on", "at least one runner label is required").into());
    }

    match (config.release.trigger, &config.release.schedule) {
        (ReleaseTrigger::Scheduled, None) => {
            return Err(invalid("release.schedule", "a scheduled trigger needs a cron expression").into());
        }
        (ReleaseTrigger::Scheduled, Some(cron)) if cron.split_whitespace().count() != 5 => {
            return Err(invalid("release.schedule", format!("'{}' is not a five-field cron expression", cron)).into());
        }
        (ReleaseTrigger::Continuous | ReleaseTrigger::Manual, Some(_)) => {
            return Err(invalid("release.schedule", "only used with the scheduled trigger").into());
        }
        _ => {}
    }

    if let Some(name) = &config.release.workflow_name {
        if name.is_empty() || name.contains('/') {
            return Err(invalid("release.workflow_name", "must be a plain file stem").into());
        }
    }

    Ok(())
}

fn validate_packages(config: &Config) -> Result<()> {
    if !config.packages.is_empty() {
        debug!(count = config.packages.len(), "validating packages");
    }

    let mut names: HashMap<&str, usize> = HashMap::new();
    let mut directories: HashMap<String, &str> = HashMap::new();

    for (i, package) in config.packages.iter().enumerate() {
        if package.name.is_empty() {
            return Err(invalid(format!("packages[{}].name", i), "package name cannot be empty").into());
        }
        if !is_valid_package_name(&package.name) {
            return Err(invalid(
                format!("packages[{}].name", i),
                format!("'{}' is not a valid package name", package.name),
            )
            .into());
        }
        if names.insert(&package.name, i).is_some() {
            return Err(invalid(
                format!("packages[{}].name", i),
                format!("duplicate package '{}'", package.name),
            )
            .into());
        }

        let directory = package_directory(package);
        if directory.starts_with('/') || directory.split('/').any(|part| part == "..") {
            return Err(invalid(
                format!("packages[{}].directory", i),
                "must be a relative path inside the repository",
            )
            .into());
        }
        if let Some(other) = directories.insert(directory.clone(), &package.name) {
            return Err(invalid(
                format!("packages[{}].directory", i),
                format!("'{}' is already used by '{}'", directory, other),
            )
            .into());
        }

        for dep in package.deps.iter().chain(&package.peer_deps).chain(&package.dev_deps) {
            if dep.name() == package.name {
                return Err(invalid(
                    format!("packages[{}].deps", i),
                    format!("'{}' cannot depend on itself", package.name),
                )
                .into());
            }
        }
    }

    Ok(())
}

/// Directory a package config resolves to (`directory`, else `<scope>/<name>`)
pub fn package_directory(package: &PackageConfig) -> String {
    match &package.directory {
        Some(dir) => dir.trim_end_matches('/').to_string(),
        None => format!(
            "{}/{}",
            package.scope.as_deref().unwrap_or(DEFAULT_SCOPE),
            package.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str) -> PackageConfig {
        PackageConfig {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_package_names() {
        assert!(is_valid_package_name("one"));
        assert!(is_valid_package_name("@cdklabs/one"));
        assert!(!is_valid_package_name("One"));
        assert!(!is_valid_package_name("@scope"));
        assert!(!is_valid_package_name(""));
    }

    #[test]
    fn test_validate_duplicate_package() {
        let mut config = Config::default();
        config.packages = vec![package("one"), package("one")];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_directory() {
        let mut config = Config::default();
        let mut two = package("two");
        two.directory = Some("packages/one".to_string());
        config.packages = vec![package("one"), two];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("already used by 'one'"));
    }

    #[test]
    fn test_validate_repository_url() {
        let mut config = Config::default();
        config.repository = Some("not a url".to_string());
        assert!(validate_config(&config).is_err());

        config.repository = Some("https://github.com/cdklabs/one.git".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_release_schedule() {
        let mut config = Config::default();
        config.release.enabled = true;
        config.release.trigger = ReleaseTrigger::Scheduled;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("cron expression"));

        config.release.schedule = Some("every day".to_string());
        assert!(validate_config(&config).is_err());

        config.release.schedule = Some("0 5 * * 1".to_string());
        assert!(validate_config(&config).is_ok());

        config.release.trigger = ReleaseTrigger::Continuous;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("only used with the scheduled trigger"));
    }

    #[test]
    fn test_validate_escaping_directory() {
        let mut config = Config::default();
        let mut one = package("one");
        one.directory = Some("../outside".to_string());
        config.packages = vec![one];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_package_directory_defaults() {
        assert_eq!(package_directory(&package("one")), "packages/one");

        let mut scoped = package("@cdklabs/one");
        scoped.scope = Some("libs".to_string());
        assert_eq!(package_directory(&scoped), "libs/@cdklabs/one");
    }
}
