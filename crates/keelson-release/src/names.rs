//! Identifiers used in the generated release workflow

use std::sync::LazyLock;

use regex::Regex;

/// Id of the job that builds every package
pub const RELEASE_JOB_ID: &str = "release";

/// Id of the step that records the remote head after the build
pub const GIT_REMOTE_STEP_ID: &str = "git_remote";

/// Output of the release job holding the remote head
pub const LATEST_COMMIT_OUTPUT: &str = "latest_commit";

/// Directory every package builds its release artifacts into
pub const ARTIFACTS_DIR: &str = "dist";

/// File that records artifact permissions across the upload
pub const PERMISSION_BACKUP_FILE: &str = "permissions-backup.acl";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("Invalid regex"));

static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9-]+").expect("Invalid regex"));

/// Make `name` usable as a job or output id.
///
/// `@cdklabs/one` becomes `cdklabs-one`.
pub fn slugify(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "-");
    LEADING_DIGITS.replace(&replaced, "").into_owned()
}

/// Name of the artifact a package uploads, unique per package
pub fn build_artifact_name(package: &str) -> String {
    slugify(&format!("{}_build-artifact", package))
}

/// Release job output telling whether `package` should be published
pub fn publish_output_id(package: &str) -> String {
    format!("publish-{}", slugify(package))
}

/// Id of the step that computes [`publish_output_id`]
pub fn check_publish_step_id(package: &str) -> String {
    format!("check-{}", publish_output_id(package))
}

/// Id of a per-package publish job
pub fn package_job_id(package: &str, job: &str) -> String {
    format!("{}_{}", slugify(package), job)
}

/// Workflow file stem for a release branch
pub fn workflow_name(branch: &str, configured: Option<&str>) -> String {
    match configured {
        Some(name) => name.to_string(),
        None if branch == "main" || branch == "master" => "release".to_string(),
        None => format!("release-{}", branch),
    }
}
