//! Error types for Keelson

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using KeelsonError
pub type Result<T> = std::result::Result<T, KeelsonError>;

/// Main error type for Keelson operations
#[derive(Debug, Error)]
pub enum KeelsonError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Workspace graph errors
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Adapter-related errors
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Release orchestration errors
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Two options that cannot be combined were both set
    #[error("{package}: {first} and {second} cannot be used together")]
    MutuallyExclusiveOption {
        package: String,
        first: String,
        second: String,
    },

    /// A public package depends on a private workspace package
    #[error(
        "{package} is public and cannot depend on any private packages, but {dependency} is private ({kind} dependency)"
    )]
    PrivateDependency {
        package: String,
        dependency: String,
        kind: String,
    },

    /// Two released packages map to the same workflow id
    #[error("{first} and {second} both map to the workflow id '{slug}'; rename one of them")]
    IdCollision {
        slug: String,
        first: String,
        second: String,
    },

    /// A collaborator the configuration requires is missing
    #[error("{0}")]
    MissingCollaborator(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Workspace graph errors
#[derive(Debug, Error)]
pub enum GraphError {
    /// Package name registered twice
    #[error("Duplicate workspace package name: {0}")]
    DuplicateName(String),

    /// Package directory registered twice
    #[error("Workspace directory {directory} is used by both {first} and {second}")]
    DuplicateDirectory {
        directory: String,
        first: String,
        second: String,
    },

    /// Workspace dependencies form a cycle
    #[error("Circular workspace dependency: {0}")]
    Cycle(String),

    /// A dependency edge names a package that was never registered
    #[error("{package} depends on workspace package {dependency}, which is not registered")]
    UnknownWorkspace { package: String, dependency: String },

    /// Lookup of an unregistered package
    #[error("Workspace package not found: {0}")]
    NotFound(String),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse version
    #[error("Failed to parse version '{0}': {1}")]
    ParseFailed(String, String),

    /// Unknown reference policy
    #[error("Unknown version reference policy: {0}")]
    UnknownPolicy(String),

    /// The next-version override command failed
    #[error("Next version command failed: {0}")]
    NextVersionCommand(String),

    /// The next version leaves the pinned major line
    #[error("Next version {version} is not in the pinned major version {major}")]
    MajorVersionExceeded { version: String, major: u64 },

    /// Semver error
    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}

/// Adapter-related errors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Package manifest not found
    #[error("Package manifest not found at {0}")]
    ManifestNotFound(PathBuf),

    /// Failed to parse manifest
    #[error("Failed to parse manifest {path}: {reason}")]
    ManifestParseError { path: PathBuf, reason: String },

    /// Failed to update manifest
    #[error("Failed to update manifest: {0}")]
    ManifestUpdateError(String),

    /// Module resolution of a dependency manifest failed
    #[error("Cannot resolve {dependency}/package.json from {from}")]
    DependencyNotResolved { dependency: String, from: PathBuf },

    /// Malformed command line arguments
    #[error("{0}")]
    InvalidArguments(String),

    /// Command execution failed
    #[error("Command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    /// Tool not found on PATH
    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Release orchestration errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Release trigger not supported
    #[error("Unsupported release trigger: {0}")]
    UnsupportedTrigger(String),

    /// Task runtime failure
    #[error("Task '{task}' failed: {reason}")]
    TaskFailed { task: String, reason: String },

    /// Task not defined
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Required environment variable missing
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Invalid tag pattern
    #[error("Invalid tag pattern: {0}")]
    InvalidPattern(String),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

impl KeelsonError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
