use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rocode_config::CommitIdentity;
use rocode_git::{extract_hunk, CloneSpec, Vcs};

/// Working directory of one run. Owned workspaces were created by this run
/// and are deleted on release; supplied checkouts are left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub path: PathBuf,
    pub owned: bool,
    released: bool,
}

impl Workspace {
    pub fn owned(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: true,
            released: false,
        }
    }

    pub fn supplied(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

pub struct WorkspaceManager {
    vcs: Arc<dyn Vcs>,
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(vcs: Arc<dyn Vcs>, root: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            root: root.into(),
        }
    }

    /// Decide where the run works without touching the filesystem, so the
    /// workspace can be released even when populating it fails.
    pub fn plan(
        &self,
        skip_clone: bool,
        supplied: Option<&Path>,
        repository_id: &str,
    ) -> anyhow::Result<Workspace> {
        if skip_clone {
            let path = supplied
                .filter(|path| !path.as_os_str().is_empty())
                .context("skip-clone requires a workspace path")?;
            return Ok(Workspace::supplied(path));
        }
        Ok(Workspace::owned(self.root.join(repository_id)))
    }

    /// Populate a planned workspace: clone into it when owned, or check the
    /// supplied checkout exists. Clone failures are not retried.
    pub async fn acquire(&self, workspace: &Workspace, spec: &CloneSpec) -> anyhow::Result<()> {
        if !workspace.owned {
            anyhow::ensure!(
                workspace.path.is_dir(),
                "workspace {} does not exist",
                workspace.path.display()
            );
            tracing::info!(path = %workspace.path.display(), "using existing checkout");
            return Ok(());
        }

        if workspace.path.exists() {
            tracing::warn!(path = %workspace.path.display(), "removing stale workspace");
            tokio::fs::remove_dir_all(&workspace.path)
                .await
                .with_context(|| format!("failed to clear {}", workspace.path.display()))?;
        }
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        tracing::info!(branch = %spec.branch, path = %workspace.path.display(), "cloning");
        self.vcs
            .clone_branch(spec, &workspace.path)
            .await
            .with_context(|| format!("failed to clone branch `{}`", spec.branch))?;
        Ok(())
    }

    /// Set the commit identity. Supplied checkouts keep their own identity.
    pub async fn configure_identity(
        &self,
        workspace: &Workspace,
        identity: &CommitIdentity,
    ) -> anyhow::Result<()> {
        if !workspace.owned {
            return Ok(());
        }
        self.vcs
            .configure_identity(&workspace.path, &identity.name, &identity.email)
            .await
            .context("failed to configure git identity")
    }

    /// Best-effort removal of an owned workspace. Never fails; repeated calls
    /// are no-ops.
    pub async fn release(&self, workspace: &mut Workspace) {
        if workspace.released {
            return;
        }
        workspace.released = true;
        if !workspace.owned {
            return;
        }
        match tokio::fs::remove_dir_all(&workspace.path).await {
            Ok(()) => tracing::debug!(path = %workspace.path.display(), "workspace removed"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(path = %workspace.path.display(), %error, "failed to remove workspace")
            }
        }
    }

    /// Diff hunk around `line` of `file` against the target branch, or the
    /// whole file diff when no hunk matches.
    pub async fn diff_hunk(
        &self,
        workspace: &Workspace,
        target_branch: &str,
        file: &str,
        line: Option<u32>,
    ) -> anyhow::Result<String> {
        let file = file.trim_start_matches('/');
        let diff = self
            .vcs
            .diff_against(&workspace.path, target_branch, Some(file))
            .await
            .with_context(|| format!("failed to diff {file} against {target_branch}"))?;
        Ok(extract_hunk(&diff, line))
    }

    pub async fn has_changes(&self, workspace: &Workspace) -> anyhow::Result<bool> {
        self.vcs
            .has_uncommitted_changes(&workspace.path)
            .await
            .context("failed to inspect working tree")
    }

    pub async fn commit_and_push(
        &self,
        workspace: &Workspace,
        message: &str,
        branch: &str,
    ) -> anyhow::Result<()> {
        self.vcs
            .commit_all(&workspace.path, message)
            .await
            .context("failed to commit changes")?;
        self.vcs
            .push(&workspace.path, branch)
            .await
            .with_context(|| format!("failed to push to `{branch}`"))
    }
}
