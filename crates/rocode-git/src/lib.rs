//! Version-control edge used by the run orchestrator.

pub mod cli;
pub mod diff;

use std::path::Path;

use async_trait::async_trait;

pub use cli::GitCli;
pub use diff::{extract_hunk, parse_hunks, Hunk};

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git is not installed or not on PATH")]
    NotInstalled,

    #[error("failed to run `git {args}`: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {args}` failed (exit {code:?}): {stderr}")]
    Failed {
        args: String,
        code: Option<i32>,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, GitError>;

/// Shallow single-branch clone request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneSpec {
    pub url: String,
    pub branch: String,
    pub depth: u32,
}

impl CloneSpec {
    pub fn new(url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            depth: 1,
        }
    }
}

/// The git operations the orchestrator relies on. Only success/failure and
/// stdout matter to callers.
#[async_trait]
pub trait Vcs: Send + Sync {
    async fn clone_branch(&self, spec: &CloneSpec, dest: &Path) -> Result<()>;

    async fn configure_identity(&self, dir: &Path, name: &str, email: &str) -> Result<()>;

    async fn has_uncommitted_changes(&self, dir: &Path) -> Result<bool>;

    /// Stage everything and commit.
    async fn commit_all(&self, dir: &Path, message: &str) -> Result<()>;

    /// Push `HEAD` to `branch` on `origin`.
    async fn push(&self, dir: &Path, branch: &str) -> Result<()>;

    /// Fetch `target_branch` and diff the working tree against it.
    async fn diff_against(&self, dir: &Path, target_branch: &str, file: Option<&str>)
        -> Result<String>;
}
