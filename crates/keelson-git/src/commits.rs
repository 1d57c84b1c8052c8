//! Commit history operations

use std::path::Path;

use chrono::{TimeZone, Utc};
use git2::{DiffOptions, Oid, Sort};
use tracing::debug;

use crate::repository::{GitRepo, Result};
use crate::types::CommitInfo;

impl GitRepo {
    /// Commits reachable from HEAD but not from `since`, newest first.
    ///
    /// With `path`, only commits that touch files under that path (relative
    /// to the working tree) are returned. Merge commits are skipped.
    pub fn commits_since(&self, since: Option<Oid>, path: Option<&Path>) -> Result<Vec<CommitInfo>> {
        if !self.has_commits() {
            return Ok(Vec::new());
        }
        let head = self.head_commit()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;
        if let Some(since) = since {
            revwalk.hide(since)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() > 1 {
                continue;
            }
            if let Some(path) = path {
                if !self.touches(&commit, path)? {
                    continue;
                }
            }
            commits.push(commit_to_info(&commit));
        }

        debug!(count = commits.len(), "collected commits");
        Ok(commits)
    }

    /// Commits since the tag named `tag_name`, or the whole history without one
    pub fn commits_since_tag(&self, tag_name: Option<&str>, path: Option<&Path>) -> Result<Vec<CommitInfo>> {
        let since = match tag_name {
            Some(name) => {
                let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
                Some(reference.peel_to_commit()?.id())
            }
            None => None,
        };
        self.commits_since(since, path)
    }

    fn touches(&self, commit: &git2::Commit<'_>, path: &Path) -> Result<bool> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };

        let mut options = DiffOptions::new();
        options.pathspec(path);
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;
        Ok(diff.deltas().len() > 0)
    }
}

/// Convert a git2 Commit to CommitInfo
fn commit_to_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();
    let message = commit.summary().unwrap_or("(no message)").to_string();
    let body = commit.body().map(|b| b.to_string()).unwrap_or_default();

    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);

    CommitInfo::new(
        commit.id().to_string(),
        message,
        author.name().unwrap_or("Unknown"),
        timestamp,
    )
    .with_body(body)
}
