//! Version reference policies
//!
//! A policy decides which semver range a package writes for a sibling
//! dependency once that sibling's concrete version is known at release time.
//! Between releases every sibling range is reset to a fixed placeholder so no
//! real version number is ever committed.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// Range written for every sibling dependency between releases
pub const RESET_RANGE: &str = "^0.0.0";

/// Strategy for turning a concrete version into a dependency range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionReferencePolicy {
    /// `^{major}`
    #[serde(alias = "current-major")]
    AnyMinor,
    /// `^{version}`
    #[default]
    #[serde(alias = "major")]
    FutureMinor,
    /// `~{major}.{minor}`
    #[serde(alias = "current-minor")]
    AnyPatch,
    /// `~{version}`
    #[serde(alias = "minor")]
    FuturePatch,
    /// `{version}`
    Exact,
    /// `>={version}`
    #[serde(alias = "minimal")]
    AnyFuture,
    /// `*`
    Any,
}

impl VersionReferencePolicy {
    /// All policies, in declaration order
    pub const ALL: [VersionReferencePolicy; 7] = [
        Self::AnyMinor,
        Self::FutureMinor,
        Self::AnyPatch,
        Self::FuturePatch,
        Self::Exact,
        Self::AnyFuture,
        Self::Any,
    ];

    /// Canonical name used on command lines and in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnyMinor => "any-minor",
            Self::FutureMinor => "future-minor",
            Self::AnyPatch => "any-patch",
            Self::FuturePatch => "future-patch",
            Self::Exact => "exact",
            Self::AnyFuture => "any-future",
            Self::Any => "any",
        }
    }

    /// Compute the range for `version` under this policy
    pub fn resolve(&self, version: &str) -> Result<String, VersionError> {
        resolve(*self, version)
    }
}

impl fmt::Display for VersionReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionReferencePolicy {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any-minor" | "current-major" => Ok(Self::AnyMinor),
            "future-minor" | "major" => Ok(Self::FutureMinor),
            "any-patch" | "current-minor" => Ok(Self::AnyPatch),
            "future-patch" | "minor" => Ok(Self::FuturePatch),
            "exact" => Ok(Self::Exact),
            "any-future" | "minimal" => Ok(Self::AnyFuture),
            "any" => Ok(Self::Any),
            other => Err(VersionError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Compute the dependency range for `version` under `policy`.
///
/// Only `any-minor` and `any-patch` need to decompose the version, so only
/// those fail on input that is not valid semver.
pub fn resolve(policy: VersionReferencePolicy, version: &str) -> Result<String, VersionError> {
    let range = match policy {
        VersionReferencePolicy::Exact => version.to_string(),
        VersionReferencePolicy::AnyMinor => {
            let parsed = parse(version)?;
            format!("^{}", parsed.major)
        }
        VersionReferencePolicy::FutureMinor => format!("^{}", version),
        VersionReferencePolicy::AnyPatch => {
            let parsed = parse(version)?;
            format!("~{}.{}", parsed.major, parsed.minor)
        }
        VersionReferencePolicy::FuturePatch => format!("~{}", version),
        VersionReferencePolicy::AnyFuture => format!(">={}", version),
        VersionReferencePolicy::Any => "*".to_string(),
    };
    Ok(range)
}

/// The placeholder range restored by `unbump`
pub fn reset() -> &'static str {
    RESET_RANGE
}

fn parse(version: &str) -> Result<Version, VersionError> {
    Version::parse(version.trim())
        .map_err(|e| VersionError::ParseFailed(version.to_string(), e.to_string()))
}
