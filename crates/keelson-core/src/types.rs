//! Core types for Keelson

use serde::{Deserialize, Serialize};

/// How a package depends on another package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Regular runtime dependency (`dependencies`)
    Runtime,
    /// Peer dependency (`peerDependencies`)
    Peer,
    /// Build/test-time dependency (`devDependencies`)
    Dev,
}

impl DependencyKind {
    /// All dependency kinds
    pub const ALL: [DependencyKind; 3] = [Self::Runtime, Self::Peer, Self::Dev];

    /// Returns the string representation of the dependency kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Peer => "peer",
            Self::Dev => "dev",
        }
    }

    /// The package.json section holding dependencies of this kind
    pub fn manifest_section(&self) -> &'static str {
        match self {
            Self::Runtime => "dependencies",
            Self::Peer => "peerDependencies",
            Self::Dev => "devDependencies",
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runtime" | "prod" | "deps" => Ok(Self::Runtime),
            "peer" => Ok(Self::Peer),
            "dev" | "build" | "test" => Ok(Self::Dev),
            _ => Err(format!("Unknown dependency kind: {}", s)),
        }
    }
}

/// JavaScript package manager driving the workspace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManager {
    /// Yarn 1.x workspaces
    #[default]
    YarnClassic,
}

impl PackageManager {
    /// Executable name
    pub fn binary(&self) -> &'static str {
        match self {
            Self::YarnClassic => "yarn",
        }
    }

    /// Command that runs a script in every workspace, in workspace order
    pub fn fan_out(&self, script: &str) -> String {
        match self {
            Self::YarnClassic => {
                if script.is_empty() {
                    "yarn workspaces run".to_string()
                } else {
                    format!("yarn workspaces run {}", script)
                }
            }
        }
    }

    /// Arguments for a local install
    pub fn install_args(&self) -> &'static [&'static str] {
        match self {
            Self::YarnClassic => &["install", "--check-files"],
        }
    }

    /// Install command used in CI, where the lockfile must not change
    pub fn frozen_install_command(&self) -> &'static str {
        match self {
            Self::YarnClassic => "yarn install --check-files --frozen-lockfile",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YarnClassic => write!(f, "yarn-classic"),
        }
    }
}
