//! Version bump and reset
//!
//! `bump` runs inside a package directory during the release task. It finds
//! the package's latest release tag, looks at the commits since then and
//! writes the next version into the manifest together with the version,
//! tag and changelog files the publish jobs consume. `unbump` puts the
//! manifest back to `0.0.0` so that no real version is ever committed.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use keelson_adapters::npm::PackageJson;
use keelson_core::error::{ReleaseError, Result, VersionError};
use keelson_git::{CommitInfo, GitRepo, TagInfo};
use regex::Regex;
use semver::{Prerelease, Version};
use tracing::{debug, info, instrument, warn};

/// Version every package carries in source control
pub const DEVELOPMENT_VERSION: &str = "0.0.0";

static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<description>.+)$",
    )
    .expect("Invalid regex")
});

static BREAKING_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^BREAKING[ -]CHANGE: ").expect("Invalid regex"));

/// How far a version moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpKind {
    /// Keep the version
    None,
    /// `x.y.Z`
    Patch,
    /// `x.Y.0`
    Minor,
    /// `X.0.0`
    Major,
}

impl BumpKind {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "patch" => Some(Self::Patch),
            "minor" => Some(Self::Minor),
            "major" => Some(Self::Major),
            _ => None,
        }
    }
}

/// Settings read from the `bump` task environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOptions {
    /// Manifest receiving the new version
    pub outfile: String,
    /// Changelog output
    pub changelog: String,
    /// Version output
    pub bumpfile: String,
    /// Release tag output
    pub releasetag: String,
    /// Prefix of this package's tags
    pub tag_prefix: String,
    /// Pinned major version
    pub major: Option<u64>,
    /// Major version floor
    pub min_major: Option<u64>,
    /// Prerelease identifier
    pub prerelease: Option<String>,
    /// Command deciding the next version
    pub next_version_command: Option<String>,
    /// Command listing releasable commits
    pub releasable_commits: Option<String>,
}

impl BumpOptions {
    /// Read options through `lookup`, usually the task environment layered
    /// over the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| ReleaseError::MissingEnv(key.to_string()));
        let optional = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let number = |key: &str| -> Result<Option<u64>> {
            optional(key)
                .map(|v| {
                    v.parse::<u64>()
                        .map_err(|e| VersionError::ParseFailed(v.clone(), e.to_string()).into())
                })
                .transpose()
        };

        let major = number("MAJOR")?;
        let min_major = number("MIN_MAJOR")?;
        if major.is_some() && min_major.is_some() {
            let prefix = lookup("RELEASE_TAG_PREFIX").unwrap_or_default();
            let package = match prefix.strip_suffix('@') {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => "bump".to_string(),
            };
            return Err(keelson_core::error::ConfigError::MutuallyExclusiveOption {
                package,
                first: "MIN_MAJOR".to_string(),
                second: "MAJOR".to_string(),
            }
            .into());
        }

        Ok(Self {
            outfile: required("OUTFILE")?,
            changelog: required("CHANGELOG")?,
            bumpfile: required("BUMPFILE")?,
            releasetag: required("RELEASETAG")?,
            tag_prefix: lookup("RELEASE_TAG_PREFIX").unwrap_or_default(),
            major,
            min_major,
            prerelease: optional("PRERELEASE"),
            next_version_command: optional("NEXT_VERSION_COMMAND"),
            releasable_commits: optional("RELEASABLE_COMMITS"),
        })
    }

    /// Tag name for `version`
    pub fn tag_for(&self, version: &Version) -> String {
        format!("{}v{}", self.tag_prefix, version)
    }
}

/// A commit following the Conventional Commits format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    /// Short hash
    pub hash: String,
    /// Commit type (`feat`, `fix`, ...)
    pub commit_type: String,
    /// Optional scope
    pub scope: Option<String>,
    /// Breaking change marker or footer
    pub breaking: bool,
    /// Subject after the colon
    pub description: String,
}

impl ConventionalCommit {
    /// The bump this commit asks for
    pub fn bump(&self) -> BumpKind {
        if self.breaking {
            BumpKind::Major
        } else if self.commit_type == "feat" {
            BumpKind::Minor
        } else {
            BumpKind::Patch
        }
    }
}

/// Parse a commit; `None` when the subject is not conventional
pub fn parse_commit(commit: &CommitInfo) -> Option<ConventionalCommit> {
    let caps = CONVENTIONAL_REGEX.captures(&commit.message)?;
    let breaking_footer = commit
        .body
        .as_deref()
        .is_some_and(|body| BREAKING_FOOTER.is_match(body));

    Some(ConventionalCommit {
        hash: commit.short_hash.clone(),
        commit_type: caps.name("type")?.as_str().to_lowercase(),
        scope: caps.name("scope").map(|m| m.as_str().to_string()),
        breaking: caps.name("breaking").is_some() || breaking_footer,
        description: caps.name("description")?.as_str().to_string(),
    })
}

/// Largest bump asked for by `commits`; any commit at all is at least a patch
pub fn recommended_bump(commits: &[CommitInfo]) -> BumpKind {
    commits
        .iter()
        .map(|c| parse_commit(c).map_or(BumpKind::Patch, |p| p.bump()))
        .max()
        .unwrap_or(BumpKind::None)
}

/// First version of a package that has never been released
pub fn initial_version(options: &BumpOptions) -> Result<Version> {
    let major = options.major.or(options.min_major).unwrap_or(0);
    let mut version = Version::new(major, 0, 0);
    if let Some(pre) = &options.prerelease {
        version.pre = prerelease(pre, 0)?;
    }
    Ok(version)
}

/// Version following `latest` for a `kind` bump under `options`
pub fn next_version(latest: &Version, kind: BumpKind, options: &BumpOptions) -> Result<Version> {
    if kind == BumpKind::None {
        return Ok(latest.clone());
    }

    let mut next = match &options.prerelease {
        Some(pre) => next_prerelease(latest, kind, pre)?,
        None => next_release(latest, kind),
    };

    if let Some(min_major) = options.min_major {
        if next.major < min_major {
            let pre = next.pre.clone();
            next = Version::new(min_major, 0, 0);
            next.pre = pre;
        }
    }
    check_major_pin(&next, options)?;
    Ok(next)
}

fn check_major_pin(version: &Version, options: &BumpOptions) -> Result<()> {
    match options.major {
        Some(major) if version.major != major => Err(VersionError::MajorVersionExceeded {
            version: version.to_string(),
            major,
        }
        .into()),
        _ => Ok(()),
    }
}

fn next_release(latest: &Version, kind: BumpKind) -> Version {
    // A prerelease graduates to its own base version.
    if !latest.pre.is_empty() && kind == BumpKind::Patch {
        return Version::new(latest.major, latest.minor, latest.patch);
    }
    match kind {
        BumpKind::Major => Version::new(latest.major + 1, 0, 0),
        BumpKind::Minor => Version::new(latest.major, latest.minor + 1, 0),
        BumpKind::Patch => Version::new(latest.major, latest.minor, latest.patch + 1),
        BumpKind::None => latest.clone(),
    }
}

fn next_prerelease(latest: &Version, kind: BumpKind, id: &str) -> Result<Version> {
    if let Some(counter) = prerelease_counter(latest, id) {
        let mut next = Version::new(latest.major, latest.minor, latest.patch);
        next.pre = prerelease(id, counter + 1)?;
        return Ok(next);
    }
    let base = Version::new(latest.major, latest.minor, latest.patch);
    let mut next = next_release(&base, kind);
    next.pre = prerelease(id, 0)?;
    Ok(next)
}

fn prerelease_counter(version: &Version, id: &str) -> Option<u64> {
    let rest = version.pre.as_str().strip_prefix(id)?.strip_prefix('.')?;
    rest.parse().ok()
}

fn prerelease(id: &str, counter: u64) -> Result<Prerelease> {
    Prerelease::new(&format!("{}.{}", id, counter)).map_err(|e| VersionError::Semver(e).into())
}

/// Markdown changelog section for one release
pub fn render_changelog(version: &Version, date: NaiveDate, commits: &[ConventionalCommit]) -> String {
    let mut output = format!("## [{}] - {}\n\n", version, date.format("%Y-%m-%d"));

    let mut section = |title: &str, filter: &dyn Fn(&ConventionalCommit) -> bool| {
        let entries: Vec<&ConventionalCommit> = commits.iter().filter(|c| filter(c)).collect();
        if entries.is_empty() {
            return;
        }
        output.push_str(&format!("### {}\n\n", title));
        for commit in entries {
            match &commit.scope {
                Some(scope) => output.push_str(&format!("- **{}:** {} ({})\n", scope, commit.description, commit.hash)),
                None => output.push_str(&format!("- {} ({})\n", commit.description, commit.hash)),
            }
        }
        output.push('\n');
    };

    section("⚠ BREAKING CHANGES", &|c: &ConventionalCommit| c.breaking);
    section("Features", &|c: &ConventionalCommit| c.commit_type == "feat");
    section("Bug Fixes", &|c: &ConventionalCommit| c.commit_type == "fix");
    section("Performance Improvements", &|c: &ConventionalCommit| c.commit_type == "perf");
    output
}

/// What `bump` decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    /// Latest release tag before the bump
    pub previous_tag: Option<String>,
    /// New version
    pub version: Version,
    /// New release tag
    pub tag: String,
    /// Commits counted as releasable
    pub releasable: usize,
}

/// Compute the next version of the package in `cwd` and write every output
#[instrument(skip_all, fields(cwd = %cwd.display(), prefix = %options.tag_prefix))]
pub fn bump(cwd: &Path, options: &BumpOptions) -> Result<BumpOutcome> {
    let repo = GitRepo::discover(cwd)?;
    let latest = latest_tag(&repo, options)?;
    let package_path = repo.relative_path(cwd);

    let commits = repo.commits_since_tag(latest.as_ref().map(|t| t.name.as_str()), package_path.as_deref())?;
    let releasable = match &options.releasable_commits {
        Some(command) => {
            let tag = latest.as_ref().map(|t| t.name.clone()).unwrap_or_default();
            let output = capture(cwd, command, &[("LATEST_TAG", tag.as_str())])?;
            output.lines().filter(|l| !l.trim().is_empty()).count()
        }
        None => commits.len(),
    };

    let version = match &latest {
        None => initial_version(options)?,
        Some(tag) if releasable == 0 => {
            info!(tag = %tag.name, "no releasable commits, keeping version");
            tag.version.clone()
        }
        Some(tag) => {
            let suggested = recommended_bump(&commits).max(BumpKind::Patch);
            match &options.next_version_command {
                Some(command) => run_next_version_command(cwd, command, &tag.version, suggested, options)?,
                None => next_version(&tag.version, suggested, options)?,
            }
        }
    };

    let tag = options.tag_for(&version);
    let parsed: Vec<ConventionalCommit> = commits.iter().filter_map(parse_commit).collect();
    let changelog = render_changelog(&version, Utc::now().date_naive(), &parsed);

    let mut manifest = PackageJson::load(&cwd.join(&options.outfile))?;
    manifest.set_version(&version.to_string());
    manifest.save(&cwd.join(&options.outfile))?;
    write_output(cwd, &options.bumpfile, &version.to_string())?;
    write_output(cwd, &options.releasetag, &tag)?;
    write_output(cwd, &options.changelog, &changelog)?;

    info!(version = %version, tag = %tag, releasable, "bumped version");
    Ok(BumpOutcome {
        previous_tag: latest.map(|t| t.name),
        version,
        tag,
        releasable,
    })
}

/// Reset the manifest `outfile` in `cwd` to the development version
pub fn unbump(cwd: &Path, outfile: &str) -> Result<()> {
    let path = cwd.join(outfile);
    let mut manifest = PackageJson::load(&path)?;
    manifest.set_version(DEVELOPMENT_VERSION);
    manifest.save(&path)?;
    debug!(path = %path.display(), "reset version");
    Ok(())
}

fn latest_tag(repo: &GitRepo, options: &BumpOptions) -> Result<Option<TagInfo>> {
    let include_pre = options.prerelease.is_some();
    let tag = repo
        .tags_with_prefix(&options.tag_prefix)?
        .into_iter()
        .filter(|t| include_pre || t.version.pre.is_empty())
        .find(|t| options.major.map_or(true, |major| t.version.major == major));
    Ok(tag)
}

fn run_next_version_command(
    cwd: &Path,
    command: &str,
    latest: &Version,
    suggested: BumpKind,
    options: &BumpOptions,
) -> Result<Version> {
    let latest_text = latest.to_string();
    let output = capture(
        cwd,
        command,
        &[("VERSION", latest_text.as_str()), ("SUGGESTED_BUMP", suggested.as_str())],
    )
    .map_err(|e| VersionError::NextVersionCommand(e.to_string()))?;
    let answer = output.trim();

    if answer.is_empty() {
        return next_version(latest, suggested, options);
    }
    if let Some(kind) = BumpKind::parse(answer) {
        return next_version(latest, kind, options);
    }

    let explicit = Version::parse(answer.strip_prefix('v').unwrap_or(answer))
        .map_err(|_| VersionError::NextVersionCommand(format!("'{}' is neither a bump type nor a version", answer)))?;
    if explicit <= *latest {
        return Err(VersionError::NextVersionCommand(format!(
            "{} is not greater than the latest version {}",
            explicit, latest
        ))
        .into());
    }
    if let Some(min_major) = options.min_major {
        if explicit.major < min_major {
            return Err(VersionError::NextVersionCommand(format!(
                "{} is below the minimum major version {}",
                explicit, min_major
            ))
            .into());
        }
    }
    check_major_pin(&explicit, options)?;
    Ok(explicit)
}

fn capture(cwd: &Path, command: &str, env: &[(&str, &str)]) -> Result<String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .envs(env.iter().copied())
        .output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(command, stderr = %stderr.trim(), "command failed");
        return Err(ReleaseError::TaskFailed {
            task: command.to_string(),
            reason: format!("exited with code {}", output.status.code().unwrap_or(-1)),
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn write_output(cwd: &Path, file: &str, contents: &str) -> Result<PathBuf> {
    let path = cwd.join(file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn options(prefix: &str) -> BumpOptions {
        let env: HashMap<&str, String> = [
            ("OUTFILE", "package.json"),
            ("CHANGELOG", "dist/changelog.md"),
            ("BUMPFILE", "dist/version.txt"),
            ("RELEASETAG", "dist/releasetag.txt"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .chain([("RELEASE_TAG_PREFIX", prefix.to_string())])
        .collect();
        BumpOptions::from_lookup(|k| env.get(k).cloned()).unwrap()
    }

    fn commit(repo: &Repository, file: &str, message: &str) {
        let workdir = repo.workdir().unwrap();
        let path = workdir.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, message).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<_> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
    }

    fn tag(repo: &Repository, name: &str) {
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.tag_lightweight(name, head.as_object(), false).unwrap();
    }

    fn setup() -> (TempDir, Repository, PathBuf) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let pkg = temp.path().join("packages/one");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(pkg.join("package.json"), "{\"name\": \"one\", \"version\": \"0.0.0\"}\n").unwrap();
        commit(&repo, "packages/one/index.ts", "feat: initial");
        (temp, repo, pkg)
    }

    fn info(message: &str, body: &str) -> CommitInfo {
        CommitInfo::new("abcdef1234", message, "Test", Utc::now()).with_body(body)
    }

    #[test]
    fn test_options_from_lookup() {
        let opts = options("one@");
        assert_eq!(opts.outfile, "package.json");
        assert_eq!(opts.tag_for(&Version::new(1, 2, 3)), "one@v1.2.3");
        assert!(opts.major.is_none());

        let missing = BumpOptions::from_lookup(|_| None).unwrap_err();
        assert!(missing.to_string().contains("OUTFILE"));

        let both = BumpOptions::from_lookup(|k| match k {
            "MAJOR" | "MIN_MAJOR" => Some("1".to_string()),
            "RELEASE_TAG_PREFIX" => Some("@cdklabs/one@".to_string()),
            _ => Some("x".to_string()),
        })
        .unwrap_err();
        assert_eq!(
            both.to_string(),
            "@cdklabs/one: MIN_MAJOR and MAJOR cannot be used together"
        );
    }

    #[test]
    fn test_parse_commit() {
        let parsed = parse_commit(&info("feat(cli)!: drop flag", "")).unwrap();
        assert_eq!(parsed.commit_type, "feat");
        assert_eq!(parsed.scope.as_deref(), Some("cli"));
        assert!(parsed.breaking);

        let footer = parse_commit(&info("fix: thing", "details\n\nBREAKING CHANGE: gone")).unwrap();
        assert!(footer.breaking);

        assert!(parse_commit(&info("Update readme", "")).is_none());
    }

    #[test]
    fn test_recommended_bump() {
        assert_eq!(recommended_bump(&[]), BumpKind::None);
        assert_eq!(recommended_bump(&[info("chore: x", "")]), BumpKind::Patch);
        assert_eq!(recommended_bump(&[info("Random", "")]), BumpKind::Patch);
        assert_eq!(
            recommended_bump(&[info("fix: a", ""), info("feat: b", "")]),
            BumpKind::Minor
        );
        assert_eq!(
            recommended_bump(&[info("fix!: a", ""), info("feat: b", "")]),
            BumpKind::Major
        );
    }

    #[test]
    fn test_next_version() {
        let opts = options("");
        let v = Version::new(1, 2, 3);
        assert_eq!(next_version(&v, BumpKind::Patch, &opts).unwrap(), Version::new(1, 2, 4));
        assert_eq!(next_version(&v, BumpKind::Minor, &opts).unwrap(), Version::new(1, 3, 0));
        assert_eq!(next_version(&v, BumpKind::Major, &opts).unwrap(), Version::new(2, 0, 0));
        assert_eq!(next_version(&v, BumpKind::None, &opts).unwrap(), v);

        let pre = Version::parse("1.3.0-beta.2").unwrap();
        assert_eq!(next_version(&pre, BumpKind::Patch, &opts).unwrap(), Version::new(1, 3, 0));
    }

    #[test]
    fn test_next_version_constraints() {
        let mut opts = options("");
        opts.major = Some(1);
        let err = next_version(&Version::new(1, 2, 3), BumpKind::Major, &opts).unwrap_err();
        assert!(err.to_string().contains("pinned major version 1"));

        opts.major = None;
        opts.min_major = Some(3);
        assert_eq!(
            next_version(&Version::new(1, 2, 3), BumpKind::Patch, &opts).unwrap(),
            Version::new(3, 0, 0)
        );
    }

    #[test]
    fn test_next_prerelease() {
        let mut opts = options("");
        opts.prerelease = Some("beta".to_string());
        assert_eq!(
            next_version(&Version::new(1, 2, 3), BumpKind::Minor, &opts).unwrap().to_string(),
            "1.3.0-beta.0"
        );
        assert_eq!(
            next_version(&Version::parse("1.3.0-beta.0").unwrap(), BumpKind::Minor, &opts)
                .unwrap()
                .to_string(),
            "1.3.0-beta.1"
        );
        assert_eq!(initial_version(&opts).unwrap().to_string(), "0.0.0-beta.0");
    }

    #[test]
    fn test_render_changelog() {
        let commits = vec![
            parse_commit(&info("feat(core): add thing", "")).unwrap(),
            parse_commit(&info("fix: repair", "")).unwrap(),
            parse_commit(&info("chore: tidy", "")).unwrap(),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let text = render_changelog(&Version::new(1, 1, 0), date, &commits);

        assert!(text.starts_with("## [1.1.0] - 2024-05-01\n\n"));
        assert!(text.contains("### Features\n\n- **core:** add thing (abcdef1)\n"));
        assert!(text.contains("### Bug Fixes\n\n- repair (abcdef1)\n"));
        assert!(!text.contains("tidy"));
        assert!(!text.contains("BREAKING"));
    }

    #[test]
    fn test_bump_first_release_then_increments() {
        let (_temp, repo, pkg) = setup();
        let opts = options("one@");

        let first = bump(&pkg, &opts).unwrap();
        assert_eq!(first.version, Version::new(0, 0, 0));
        assert_eq!(first.tag, "one@v0.0.0");
        assert!(first.previous_tag.is_none());
        assert_eq!(std::fs::read_to_string(pkg.join("dist/releasetag.txt")).unwrap(), "one@v0.0.0");
        tag(&repo, "one@v0.0.0");

        commit(&repo, "packages/one/fix.ts", "fix: repair");
        let second = bump(&pkg, &opts).unwrap();
        assert_eq!(second.version, Version::new(0, 0, 1));
        assert_eq!(second.previous_tag.as_deref(), Some("one@v0.0.0"));
        assert_eq!(std::fs::read_to_string(pkg.join("dist/version.txt")).unwrap(), "0.0.1");
        let manifest = PackageJson::load(&pkg.join("package.json")).unwrap();
        assert_eq!(manifest.version(), Some("0.0.1"));
        tag(&repo, "one@v0.0.1");

        commit(&repo, "packages/one/feature.ts", "feat: new thing");
        assert_eq!(bump(&pkg, &opts).unwrap().version, Version::new(0, 1, 0));
    }

    #[test]
    fn test_bump_ignores_other_packages() {
        let (_temp, repo, pkg) = setup();
        let opts = options("one@");
        tag(&repo, "one@v1.0.0");

        commit(&repo, "packages/two/index.ts", "feat: unrelated");
        let outcome = bump(&pkg, &opts).unwrap();
        assert_eq!(outcome.releasable, 0);
        assert_eq!(outcome.version, Version::new(1, 0, 0));
        assert_eq!(outcome.tag, "one@v1.0.0");
    }

    #[test]
    fn test_bump_next_version_command() {
        let (_temp, repo, pkg) = setup();
        tag(&repo, "one@v1.0.0");
        commit(&repo, "packages/one/fix.ts", "fix: small");

        let mut opts = options("one@");
        opts.next_version_command = Some("echo major".to_string());
        assert_eq!(bump(&pkg, &opts).unwrap().version, Version::new(2, 0, 0));

        opts.next_version_command = Some("echo 1.5.0".to_string());
        assert_eq!(bump(&pkg, &opts).unwrap().version, Version::new(1, 5, 0));

        opts.next_version_command = Some("echo 0.9.0".to_string());
        assert!(bump(&pkg, &opts).is_err());

        opts.major = Some(1);
        opts.next_version_command = Some("echo 2.0.0".to_string());
        let err = bump(&pkg, &opts).unwrap_err();
        assert!(err.to_string().contains("pinned major version 1"));

        opts.major = None;
        opts.min_major = Some(3);
        let err = bump(&pkg, &opts).unwrap_err();
        assert!(err.to_string().contains("minimum major version 3"));
    }

    #[test]
    fn test_unbump() {
        let (_temp, _repo, pkg) = setup();
        let opts = options("one@");
        bump(&pkg, &opts).unwrap();
        std::fs::write(pkg.join("package.json"), "{\"name\": \"one\", \"version\": \"4.5.6\"}\n").unwrap();

        unbump(&pkg, "package.json").unwrap();
        let manifest = PackageJson::load(&pkg.join("package.json")).unwrap();
        assert_eq!(manifest.version(), Some("0.0.0"));
        // Release artifacts stay for the upload step.
        assert!(pkg.join("dist/version.txt").exists());
    }
}
