//! Agent seam of the orchestrator: a launcher that brings an agent up inside
//! a workspace and the conversation it hands back.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use rocode_agent_client::{
    AgentClient, AgentServer, AgentServerOptions, AgentSession, EventStreamHandle,
    ModelSelection, ReadinessPolicy,
};
use rocode_config::{AgentConfig, AgentServerConfig};

#[async_trait]
pub trait AgentLauncher: Send + Sync {
    /// Start an agent in `workspace` and open a session with it.
    async fn launch(
        &self,
        workspace: &Path,
        agent: &AgentConfig,
    ) -> anyhow::Result<Box<dyn AgentConversation>>;
}

/// One session with a running agent. `shutdown` must be called exactly once
/// the run is done with it; it never fails.
#[async_trait]
pub trait AgentConversation: Send {
    fn session(&self) -> &AgentSession;

    /// Send a prompt and return the agent's final text.
    async fn prompt(&mut self, text: &str) -> anyhow::Result<String>;

    async fn shutdown(&mut self);
}

/// Launches `opencode serve` as a child process.
#[derive(Debug, Clone)]
pub struct OpencodeLauncher {
    server: AgentServerConfig,
}

impl OpencodeLauncher {
    pub fn new(server: AgentServerConfig) -> Self {
        Self { server }
    }

    async fn open(
        &self,
        server: &AgentServer,
        agent: &AgentConfig,
    ) -> anyhow::Result<(AgentClient, AgentSession, Option<String>, Option<EventStreamHandle>)> {
        let policy = ReadinessPolicy {
            interval: self.server.ready_interval,
            max_attempts: self.server.ready_attempts,
        };
        let client = AgentClient::connect(server.base_url(), policy)
            .await
            .context("agent server did not start")?;
        let session = client
            .create_session()
            .await
            .context("failed to create agent session")?;
        let agent_name = client.resolve_agent_name(agent.agent.as_deref()).await;

        let events = match client.stream_events(&session.id).await {
            Ok(handle) => Some(handle),
            Err(error) => {
                tracing::warn!(%error, "agent progress stream unavailable");
                None
            }
        };
        Ok((client, session, agent_name, events))
    }
}

#[async_trait]
impl AgentLauncher for OpencodeLauncher {
    async fn launch(
        &self,
        workspace: &Path,
        agent: &AgentConfig,
    ) -> anyhow::Result<Box<dyn AgentConversation>> {
        let options = AgentServerOptions {
            command: self.server.command.clone(),
            hostname: self.server.hostname.clone(),
            port: self.server.port,
        };
        let mut server = AgentServer::spawn(&options, workspace)?;

        match self.open(&server, agent).await {
            Ok((client, session, agent_name, events)) => {
                tracing::info!(
                    session_id = %session.id,
                    agent = agent_name.as_deref().unwrap_or("(server default)"),
                    model = %format!("{}/{}", agent.provider_id, agent.model_id),
                    "agent session ready"
                );
                Ok(Box::new(OpencodeConversation {
                    server,
                    client,
                    session,
                    agent_name,
                    model: ModelSelection {
                        provider_id: agent.provider_id.clone(),
                        model_id: agent.model_id.clone(),
                    },
                    events,
                }))
            }
            Err(error) => {
                server.terminate().await;
                Err(error)
            }
        }
    }
}

struct OpencodeConversation {
    server: AgentServer,
    client: AgentClient,
    session: AgentSession,
    agent_name: Option<String>,
    model: ModelSelection,
    events: Option<EventStreamHandle>,
}

#[async_trait]
impl AgentConversation for OpencodeConversation {
    fn session(&self) -> &AgentSession {
        &self.session
    }

    async fn prompt(&mut self, text: &str) -> anyhow::Result<String> {
        tracing::debug!(session_id = %self.session.id, chars = text.len(), "sending prompt");
        let reply = self
            .client
            .send_prompt(
                &self.session.id,
                text,
                self.agent_name.as_deref(),
                &self.model,
            )
            .await
            .context("agent prompt failed")?;
        Ok(reply)
    }

    async fn shutdown(&mut self) {
        if let Some(mut events) = self.events.take() {
            events.stop();
        }
        self.server.terminate().await;
    }
}
