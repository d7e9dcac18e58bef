use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{CloneSpec, GitError, Result, Vcs};

/// [`Vcs`] backed by the `git` executable.
///
/// Network operations (clone, fetch, push) authenticate through an
/// `http.extraheader` bearer header so the credential never lands in a
/// remote URL or in `.git/config`.
#[derive(Clone, Default)]
pub struct GitCli {
    bearer_token: Option<String>,
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    /// Fails early with a readable error when `git` is not on PATH.
    pub fn ensure_available() -> Result<()> {
        which::which("git").map(|_| ()).map_err(|_| GitError::NotInstalled)
    }

    fn command(&self, dir: Option<&Path>, authenticated: bool) -> Command {
        let mut cmd = Command::new("git");
        if authenticated {
            if let Some(token) = &self.bearer_token {
                cmd.arg("-c")
                    .arg(format!("http.extraheader=AUTHORIZATION: bearer {token}"));
            }
        }
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Run git and return trimmed stdout. Error messages only ever include
    /// `args`, never the injected credential.
    async fn git_output(
        &self,
        dir: Option<&Path>,
        args: &[&str],
        authenticated: bool,
    ) -> Result<String> {
        let command_line = args.join(" ");
        tracing::debug!(args = %command_line, "git");
        let output = self
            .command(dir, authenticated)
            .args(args)
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                args: command_line.clone(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::Failed {
                args: command_line,
                code: output.status.code(),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn git_run(&self, dir: Option<&Path>, args: &[&str], authenticated: bool) -> Result<()> {
        self.git_output(dir, args, authenticated).await.map(|_| ())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn clone_branch(&self, spec: &CloneSpec, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        let depth = spec.depth.max(1).to_string();
        self.git_run(
            None,
            &[
                "clone",
                "--depth",
                &depth,
                "--single-branch",
                "--branch",
                &spec.branch,
                &spec.url,
                &dest,
            ],
            true,
        )
        .await
    }

    async fn configure_identity(&self, dir: &Path, name: &str, email: &str) -> Result<()> {
        self.git_run(Some(dir), &["config", "user.name", name], false)
            .await?;
        self.git_run(Some(dir), &["config", "user.email", email], false)
            .await
    }

    async fn has_uncommitted_changes(&self, dir: &Path) -> Result<bool> {
        let status = self
            .git_output(Some(dir), &["status", "--porcelain"], false)
            .await?;
        Ok(!status.trim().is_empty())
    }

    async fn commit_all(&self, dir: &Path, message: &str) -> Result<()> {
        self.git_run(Some(dir), &["add", "--all"], false).await?;
        self.git_run(Some(dir), &["commit", "-m", message], false)
            .await
    }

    async fn push(&self, dir: &Path, branch: &str) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        self.git_run(Some(dir), &["push", "origin", &refspec], true)
            .await
    }

    async fn diff_against(
        &self,
        dir: &Path,
        target_branch: &str,
        file: Option<&str>,
    ) -> Result<String> {
        let remote_ref = format!("refs/remotes/origin/{target_branch}");
        let refspec = format!("+refs/heads/{target_branch}:{remote_ref}");
        self.git_run(
            Some(dir),
            &["fetch", "--depth", "1", "origin", &refspec],
            true,
        )
        .await?;

        let mut args = vec!["diff", remote_ref.as_str()];
        if let Some(file) = file {
            args.push("--");
            args.push(file);
        }
        self.git_output(Some(dir), &args, false).await
    }
}
