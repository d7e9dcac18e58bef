#[derive(Debug, thiserror::Error)]
pub enum AgentClientError {
    #[error("failed to spawn agent server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("agent did not become ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    #[error("agent request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("agent returned {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("invalid agent response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentClientError>;
