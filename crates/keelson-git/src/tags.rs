//! Tag operations

use tracing::{debug, instrument};

use crate::repository::{GitRepo, Result};
use crate::types::TagInfo;

impl GitRepo {
    /// Release tags starting with `prefix` whose remainder is a version,
    /// newest version first
    #[instrument(skip(self))]
    pub fn tags_with_prefix(&self, prefix: &str) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();

        let names = self.repo.tag_names(None)?;
        for name in names.iter().flatten() {
            if !name.starts_with(prefix) {
                continue;
            }
            let reference = match self.repo.find_reference(&format!("refs/tags/{}", name)) {
                Ok(reference) => reference,
                Err(_) => continue,
            };
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };
            if let Some(tag) = TagInfo::parse(name, prefix, commit.id().to_string()) {
                tags.push(tag);
            }
        }

        tags.sort_by(|a, b| b.version.cmp(&a.version));
        debug!(prefix, count = tags.len(), "listed release tags");
        Ok(tags)
    }

    /// The highest-versioned release tag with `prefix`.
    ///
    /// Prerelease tags are skipped unless `include_prerelease` is set.
    pub fn latest_tag(&self, prefix: &str, include_prerelease: bool) -> Result<Option<TagInfo>> {
        let latest = self
            .tags_with_prefix(prefix)?
            .into_iter()
            .find(|t| include_prerelease || t.version.pre.is_empty());
        debug!(prefix, latest = ?latest.as_ref().map(|t| &t.name), "found latest tag");
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::commit_file;
    use git2::Repository;
    use tempfile::TempDir;

    fn setup_repo_with_tags() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let first = commit_file(&repo, "a.txt", "a", "chore: initial");
        let second = commit_file(&repo, "b.txt", "b", "feat: second");

        let first = repo.find_commit(first).unwrap();
        let second = repo.find_commit(second).unwrap();
        repo.tag_lightweight("one@1.0.0", first.as_object(), false).unwrap();
        repo.tag_lightweight("one@1.10.0", second.as_object(), false).unwrap();
        repo.tag_lightweight("one@2.0.0-beta.0", second.as_object(), false).unwrap();
        repo.tag_lightweight("two@5.0.0", second.as_object(), false).unwrap();

        let git_repo = GitRepo::open(temp.path()).unwrap();
        (temp, git_repo)
    }

    #[test]
    fn test_tags_with_prefix_sorted_by_version() {
        let (_temp, repo) = setup_repo_with_tags();
        let tags = repo.tags_with_prefix("one@").unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["one@2.0.0-beta.0", "one@1.10.0", "one@1.0.0"]);
    }

    #[test]
    fn test_latest_tag() {
        let (_temp, repo) = setup_repo_with_tags();
        assert_eq!(repo.latest_tag("one@", false).unwrap().unwrap().name, "one@1.10.0");
        assert_eq!(
            repo.latest_tag("one@", true).unwrap().unwrap().name,
            "one@2.0.0-beta.0"
        );
        assert!(repo.latest_tag("three@", true).unwrap().is_none());
    }
}
