//! Per-package publish jobs
//!
//! Each released package gets its own npm and GitHub Releases jobs. Both
//! depend on the shared `release` job and only run when the build is still
//! the tip of the branch and the package's release tag is new.

use keelson_core::config::ReleaseOptions;
use keelson_core::github::{Job, Step};

use crate::names::{
    build_artifact_name, package_job_id, publish_output_id, ARTIFACTS_DIR, LATEST_COMMIT_OUTPUT,
    PERMISSION_BACKUP_FILE, RELEASE_JOB_ID,
};
use crate::pipeline::ReleasePipeline;

/// Job key of the npm publish job, before the package prefix
pub const NPM_JOB: &str = "release_npm";
/// Job key of the GitHub Releases job, before the package prefix
pub const GITHUB_JOB: &str = "release_github";

const PUBLIB_NPM: &str = "npx -p publib@latest publib-npm";
const ALREADY_EXISTS: &str = "Release.tag_name already exists";

/// Condition shared by every publish job of `package`
pub fn publish_condition(package: &str) -> String {
    format!(
        "${{{{ needs.{job}.outputs.{latest} == github.sha && needs.{job}.outputs.{output} == 'true' }}}}",
        job = RELEASE_JOB_ID,
        latest = LATEST_COMMIT_OUTPUT,
        output = publish_output_id(package),
    )
}

/// The `gh release create` script; `-p` marks a prerelease
pub fn github_release_command(prerelease: bool) -> String {
    let tag = format!("$(cat {}/releasetag.txt)", ARTIFACTS_DIR);
    let flag = if prerelease { " -p" } else { "" };
    format!(
        "errout=$(mktemp); gh release create {tag} -R $GITHUB_REPOSITORY -F {dir}/changelog.md -t {tag} --target $GITHUB_REF{flag} 2> $errout && true; exitcode=$?; if [ $exitcode -ne 0 ] && ! grep -q \"{exists}\" $errout; then cat $errout; exit $exitcode; fi",
        tag = tag,
        dir = ARTIFACTS_DIR,
        flag = flag,
        exists = ALREADY_EXISTS,
    )
}

/// Renders the publish jobs of one package
pub struct PackagePublisher<'a> {
    pipeline: &'a ReleasePipeline,
    options: &'a ReleaseOptions,
}

impl<'a> PackagePublisher<'a> {
    /// Create a publisher for `pipeline`
    pub fn new(pipeline: &'a ReleasePipeline, options: &'a ReleaseOptions) -> Self {
        Self { pipeline, options }
    }

    fn name(&self) -> &str {
        self.pipeline.package()
    }

    /// Steps every publish job starts with: node, this package's artifact,
    /// and its original permissions
    fn common_steps(&self) -> Vec<Step> {
        vec![
            Step::uses("Setup Node.js", "actions/setup-node@v4")
                .input("node-version", self.options.node_version.clone()),
            Step::uses("Download build artifacts", "actions/download-artifact@v4")
                .input("name", build_artifact_name(self.name()))
                .input("path", ARTIFACTS_DIR),
            Step::run(
                "Restore build artifact permissions",
                format!("cd {} && setfacl --restore={}", ARTIFACTS_DIR, PERMISSION_BACKUP_FILE),
            )
            .continue_on_error(),
        ]
    }

    fn base_job(&self, title: &str) -> Job {
        let mut job = Job::new(self.options.runs_on.clone())
            .with_name(format!("{}: {}", self.name(), title))
            .needs(RELEASE_JOB_ID)
            .when(publish_condition(self.name()));
        job.steps = self.common_steps();
        job
    }

    /// Publish to npm with provenance
    pub fn npm_job(&self) -> Job {
        let release = self.pipeline.release();
        let dist_tag = release.npm_dist_tag.clone().unwrap_or_else(|| "latest".to_string());

        self.base_job("Publish to npm")
            .permission("id-token", "write")
            .permission("contents", "read")
            .step(
                Step::run("Release", PUBLIB_NPM)
                    .env("NPM_DIST_TAG", dist_tag)
                    .env("NPM_REGISTRY", self.options.npm_registry.clone())
                    .env("NPM_CONFIG_PROVENANCE", "true")
                    .env("NPM_TOKEN", "${{ secrets.NPM_TOKEN }}"),
            )
    }

    /// Create the GitHub release, tolerating one that already exists
    pub fn github_job(&self) -> Job {
        let release = self.pipeline.release();
        let mut job = self.base_job("Publish to GitHub Releases");
        if release.publishes_to_npm() {
            job = job.needs(package_job_id(self.name(), NPM_JOB));
        }
        job.permission("contents", "write").step(
            Step::run("Release", github_release_command(release.prerelease.is_some()))
                .env("GITHUB_TOKEN", "${{ secrets.GITHUB_TOKEN }}")
                .env("GITHUB_REPOSITORY", "${{ github.repository }}")
                .env("GITHUB_REF", "${{ github.sha }}"),
        )
    }

    /// Jobs keyed by their workflow id, npm first
    pub fn jobs(&self) -> Vec<(String, Job)> {
        let mut jobs = Vec::new();
        if self.pipeline.release().publishes_to_npm() {
            jobs.push((package_job_id(self.name(), NPM_JOB), self.npm_job()));
        }
        jobs.push((package_job_id(self.name(), GITHUB_JOB), self.github_job()));
        jobs
    }
}
