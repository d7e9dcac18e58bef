//! Local agent server child process (`<command> serve`).

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::error::{AgentClientError, Result};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentServerOptions {
    pub command: String,
    pub hostname: String,
    pub port: u16,
}

impl AgentServerOptions {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }
}

/// Running agent server. The child is killed when this value is dropped, so
/// an aborted run never leaves the server behind.
pub struct AgentServer {
    child: Option<Child>,
    base_url: String,
}

impl AgentServer {
    pub fn spawn(options: &AgentServerOptions, workspace: &Path) -> Result<Self> {
        let port = options.port.to_string();
        let mut cmd = Command::new(&options.command);
        cmd.args(["serve", "--hostname", &options.hostname, "--port", &port])
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| AgentClientError::Spawn {
            command: options.command.clone(),
            source,
        })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output("stdout", BufReader::new(stdout)));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output("stderr", BufReader::new(stderr)));
        }

        tracing::info!(
            command = %options.command,
            pid = child.id().unwrap_or_default(),
            workspace = %workspace.display(),
            "agent server started"
        );

        Ok(Self {
            child: Some(child),
            base_url: options.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Stop the server. Safe to call more than once.
    pub async fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(error) = child.start_kill() {
            tracing::debug!(%error, "agent server already exited");
        }
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => tracing::info!(%status, "agent server stopped"),
            Ok(Err(error)) => tracing::warn!(%error, "failed to reap agent server"),
            Err(_) => tracing::warn!("agent server did not exit within {:?}", SHUTDOWN_GRACE),
        }
    }
}

async fn forward_output<R>(stream: &'static str, mut reader: R)
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let msg = line.trim_end();
                if !msg.is_empty() {
                    tracing::debug!(target: "rocode_agent_client::server", stream, "{}", msg);
                }
            }
            Err(error) => {
                tracing::debug!(stream, %error, "agent server output closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_options() {
        let options = AgentServerOptions {
            command: "opencode".to_string(),
            hostname: "127.0.0.1".to_string(),
            port: 4096,
        };
        assert_eq!(options.base_url(), "http://127.0.0.1:4096");
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_reports_command() {
        let options = AgentServerOptions {
            command: "rocode-definitely-not-installed".to_string(),
            hostname: "127.0.0.1".to_string(),
            port: 4096,
        };
        let err = AgentServer::spawn(&options, &std::env::temp_dir())
            .err()
            .expect("spawn should fail");
        assert!(matches!(err, AgentClientError::Spawn { ref command, .. } if command == "rocode-definitely-not-installed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        // `sleep serve ...` fails immediately; terminate must still be harmless.
        let options = AgentServerOptions {
            command: "sleep".to_string(),
            hostname: "127.0.0.1".to_string(),
            port: 4096,
        };
        let mut server = AgentServer::spawn(&options, &std::env::temp_dir()).unwrap();
        server.terminate().await;
        assert!(!server.is_running());
        server.terminate().await;
        assert!(!server.is_running());
    }
}
