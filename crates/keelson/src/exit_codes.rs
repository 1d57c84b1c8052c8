//! Exit codes for the CLI

use keelson_core::error::{AdapterError, KeelsonError};

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Git error
pub const GIT_ERROR: i32 = 3;

/// Version error
pub const VERSION_ERROR: i32 = 4;

/// Validation error (workspace graph, failed checks)
pub const VALIDATION_ERROR: i32 = 5;

/// A task or release step failed
pub const TASK_ERROR: i32 = 6;

/// Malformed command line arguments
pub const USAGE_ERROR: i32 = 64;

/// Pick the exit code for a failed command
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<KeelsonError>() {
        Some(KeelsonError::Config(_)) => CONFIG_ERROR,
        Some(KeelsonError::Graph(_)) => VALIDATION_ERROR,
        Some(KeelsonError::Version(_)) => VERSION_ERROR,
        Some(KeelsonError::Git(_)) => GIT_ERROR,
        Some(KeelsonError::Release(_)) => TASK_ERROR,
        Some(KeelsonError::Adapter(AdapterError::InvalidArguments(_))) => USAGE_ERROR,
        Some(_) => ERROR,
        None if err.downcast_ref::<ValidationFailed>().is_some() => VALIDATION_ERROR,
        None => ERROR,
    }
}

/// `validate` found problems
#[derive(Debug)]
pub struct ValidationFailed(pub usize);

impl std::fmt::Display for ValidationFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed with {} error(s)", self.0)
    }
}

impl std::error::Error for ValidationFailed {}
