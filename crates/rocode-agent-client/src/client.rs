use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{AgentClientError, Result};
use crate::events::EventStreamHandle;
use crate::types::{
    AgentInfo, AgentSession, ModelSelection, PromptPart, PromptRequest, PromptResponse,
};

/// How long to wait for a freshly spawned server to accept requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 60,
        }
    }
}

/// HTTP client for the agent server API.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Poll the server until it answers, giving up after `policy.max_attempts`.
    pub async fn connect(base_url: impl Into<String>, policy: ReadinessPolicy) -> Result<Self> {
        let client = Self::new(base_url);
        let attempts = policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match client.http.get(client.url("/config")).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(attempt, base_url = %client.base_url, "agent server ready");
                    return Ok(client);
                }
                Ok(response) => {
                    tracing::debug!(attempt, status = %response.status(), "agent server not ready");
                }
                Err(error) => {
                    tracing::debug!(attempt, %error, "agent server not reachable");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(policy.interval).await;
            }
        }

        Err(AgentClientError::NotReady { attempts })
    }

    pub async fn create_session(&self) -> Result<AgentSession> {
        let response = self
            .http
            .post(self.url("/session"))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let session: AgentSession = parse_http_json(response, "/session").await?;
        tracing::info!(session_id = %session.id, "agent session created");
        Ok(session)
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>> {
        let response = self.http.get(self.url("/agent")).send().await?;
        parse_http_json(response, "/agent").await
    }

    /// Pick the agent for this run. Unknown or non-primary agents, and a
    /// failed lookup, yield `None` with a warning so the server default
    /// agent is used.
    pub async fn resolve_agent_name(&self, requested: Option<&str>) -> Option<String> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty())?;

        let agents = match self.list_agents().await {
            Ok(agents) => agents,
            Err(error) => {
                tracing::warn!(%error, requested, "could not list agents, using the server default agent");
                return None;
            }
        };

        match agents.iter().find(|agent| agent.name == requested) {
            Some(agent) if agent.is_primary() => Some(agent.name.clone()),
            Some(_) => {
                tracing::warn!(requested, "agent is not a primary agent, using the server default agent");
                None
            }
            None => {
                tracing::warn!(requested, "agent not found, using the server default agent");
                None
            }
        }
    }

    /// Send one prompt and wait for the full reply. Returns the text of the
    /// last text part, or an empty string when the reply has none.
    pub async fn send_prompt(
        &self,
        session_id: &str,
        text: &str,
        agent: Option<&str>,
        model: &ModelSelection,
    ) -> Result<String> {
        let endpoint = format!("/session/{}/message", session_id);
        let body = PromptRequest {
            model,
            agent,
            parts: vec![PromptPart { kind: "text", text }],
        };
        let response = self
            .http
            .post(self.url(&endpoint))
            .json(&body)
            .send()
            .await?;
        let reply: PromptResponse = parse_http_json(response, &endpoint).await?;
        Ok(reply.final_text())
    }

    /// Subscribe to the server event stream and print this session's
    /// progress in the background.
    pub async fn stream_events(&self, session_id: &str) -> Result<EventStreamHandle> {
        let response = self
            .http
            .get(self.url("/event"))
            .header("Accept", "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentClientError::Status {
                endpoint: "/event".to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(EventStreamHandle::spawn(response, session_id.to_string()))
    }
}

async fn parse_http_json<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(AgentClientError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}
