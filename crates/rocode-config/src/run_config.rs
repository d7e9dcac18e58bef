use std::path::PathBuf;
use std::time::Duration;

use crate::schema::{PrAgentConfig, RunMode};
use crate::ConfigError;

pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4-20250514";
pub const DEFAULT_AGENT_COMMAND: &str = "opencode";
pub const DEFAULT_AGENT_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_AGENT_PORT: u16 = 4096;
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_READY_ATTEMPTS: u32 = 60;
pub const DEFAULT_IDENTITY_NAME: &str = "OpenCode Agent";
pub const DEFAULT_IDENTITY_EMAIL: &str = "opencode-agent@users.noreply.dev.azure.com";

pub const DEFAULT_REVIEW_KEYWORDS: &[&str] = &["/oc-review", "/opencode-review"];
pub const DEFAULT_COMMAND_KEYWORDS: &[&str] = &["/oc", "/opencode"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCoordinates {
    /// Collection URL, e.g. `https://dev.azure.com/contoso`.
    pub organization_url: String,
    pub project: String,
    pub repository_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Requested agent name; `None` uses the server default.
    pub agent: Option<String>,
    pub provider_id: String,
    pub model_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerKeywords {
    pub review: Vec<String>,
    pub command: Vec<String>,
}

impl Default for TriggerKeywords {
    fn default() -> Self {
        Self {
            review: DEFAULT_REVIEW_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            command: DEFAULT_COMMAND_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentServerConfig {
    pub command: String,
    pub hostname: String,
    pub port: u16,
    pub ready_interval: Duration,
    pub ready_attempts: u32,
}

impl Default for AgentServerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_AGENT_COMMAND.to_string(),
            hostname: DEFAULT_AGENT_HOSTNAME.to_string(),
            port: DEFAULT_AGENT_PORT,
            ready_interval: DEFAULT_READY_INTERVAL,
            ready_attempts: DEFAULT_READY_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl Default for CommitIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_IDENTITY_NAME.to_string(),
            email: DEFAULT_IDENTITY_EMAIL.to_string(),
        }
    }
}

/// Immutable per-invocation input.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub repository: RepositoryCoordinates,
    pub pull_request_id: u64,
    pub thread_id: Option<u64>,
    pub comment_id: Option<u64>,
    pub access_token: String,
    pub agent: AgentConfig,
    /// Workspace root when cloning; the checkout itself when `skip_clone` is set.
    pub workspace: Option<PathBuf>,
    pub mode: Option<RunMode>,
    pub skip_clone: bool,
    pub instructions: Option<String>,
    pub keywords: TriggerKeywords,
    pub server: AgentServerConfig,
    pub identity: CommitIdentity,
}

impl RunConfig {
    /// Directory clones are placed under when no workspace was configured.
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("rocode-pr"))
    }

    /// Thread/comment pair identifying the trigger comment, when configured.
    pub fn trigger_ids(&self) -> Option<(u64, u64)> {
        match (self.thread_id, self.comment_id) {
            (Some(thread_id), Some(comment_id)) => Some((thread_id, comment_id)),
            _ => None,
        }
    }
}

pub fn parse_model_and_provider(model: Option<String>) -> (Option<String>, Option<String>) {
    let Some(raw) = model else {
        return (None, None);
    };
    if let Some((provider, model_id)) = raw.split_once('/') {
        (
            Some(provider.trim().to_string()),
            Some(model_id.trim().to_string()),
        )
    } else {
        (None, Some(raw))
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(field))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn keyword_group(value: Option<Vec<String>>, defaults: &[&str]) -> Vec<String> {
    let group: Vec<String> = value
        .unwrap_or_default()
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if group.is_empty() {
        defaults.iter().map(|k| k.to_string()).collect()
    } else {
        group
    }
}

impl TryFrom<PrAgentConfig> for RunConfig {
    type Error = ConfigError;

    fn try_from(config: PrAgentConfig) -> Result<Self, Self::Error> {
        let organization_url = required(config.organization_url, "organizationUrl")?;
        let project = required(config.project, "project")?;
        let repository_id = required(config.repository_id, "repositoryId")?;
        let pull_request_id = config
            .pull_request_id
            .ok_or(ConfigError::MissingField("pullRequestId"))?;
        let access_token = required(config.access_token, "accessToken")?;

        if config.thread_id.is_some() != config.comment_id.is_some() {
            return Err(ConfigError::IncompleteTrigger);
        }

        let raw_model = non_empty(config.model).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let (provider_id, model_id) = match parse_model_and_provider(Some(raw_model.clone())) {
            (Some(provider), Some(model)) if !provider.is_empty() && !model.is_empty() => {
                (provider, model)
            }
            _ => return Err(ConfigError::InvalidModel(raw_model)),
        };

        let keywords = config.keywords.unwrap_or_default();
        let server = config.server.unwrap_or_default();
        let identity = config.identity.unwrap_or_default();
        let defaults = AgentServerConfig::default();

        Ok(Self {
            repository: RepositoryCoordinates {
                organization_url: organization_url.trim_end_matches('/').to_string(),
                project,
                repository_id,
            },
            pull_request_id,
            thread_id: config.thread_id,
            comment_id: config.comment_id,
            access_token,
            agent: AgentConfig {
                agent: non_empty(config.agent),
                provider_id,
                model_id,
            },
            workspace: config
                .workspace
                .filter(|path| !path.as_os_str().is_empty()),
            mode: config.mode,
            skip_clone: config.skip_clone.unwrap_or(false),
            instructions: non_empty(config.instructions),
            keywords: TriggerKeywords {
                review: keyword_group(keywords.review, DEFAULT_REVIEW_KEYWORDS),
                command: keyword_group(keywords.command, DEFAULT_COMMAND_KEYWORDS),
            },
            server: AgentServerConfig {
                command: non_empty(server.command).unwrap_or(defaults.command),
                hostname: non_empty(server.hostname).unwrap_or(defaults.hostname),
                port: server.port.unwrap_or(defaults.port),
                ready_interval: server
                    .ready_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.ready_interval),
                ready_attempts: server
                    .ready_attempts
                    .filter(|attempts| *attempts > 0)
                    .unwrap_or(defaults.ready_attempts),
            },
            identity: CommitIdentity {
                name: non_empty(identity.name).unwrap_or_else(|| DEFAULT_IDENTITY_NAME.to_string()),
                email: non_empty(identity.email)
                    .unwrap_or_else(|| DEFAULT_IDENTITY_EMAIL.to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::KeywordsConfig;

    fn minimal() -> PrAgentConfig {
        PrAgentConfig {
            organization_url: Some("https://dev.azure.com/contoso/".to_string()),
            project: Some("Web".to_string()),
            repository_id: Some("repo-1".to_string()),
            pull_request_id: Some(42),
            access_token: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = RunConfig::try_from(minimal()).unwrap();
        assert_eq!(config.repository.organization_url, "https://dev.azure.com/contoso");
        assert_eq!(config.agent.provider_id, "anthropic");
        assert_eq!(config.agent.model_id, "claude-sonnet-4-20250514");
        assert_eq!(config.server.port, DEFAULT_AGENT_PORT);
        assert_eq!(config.keywords, TriggerKeywords::default());
        assert!(config.mode.is_none());
        assert!(!config.skip_clone);
        assert!(config.trigger_ids().is_none());
    }

    #[test]
    fn test_missing_token_is_reported() {
        let mut raw = minimal();
        raw.access_token = Some("  ".to_string());
        let err = RunConfig::try_from(raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("accessToken")));
    }

    #[test]
    fn test_thread_without_comment_is_rejected() {
        let mut raw = minimal();
        raw.thread_id = Some(7);
        let err = RunConfig::try_from(raw).unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteTrigger));
    }

    #[test]
    fn test_model_without_provider_is_rejected() {
        let mut raw = minimal();
        raw.model = Some("gpt-4.1".to_string());
        let err = RunConfig::try_from(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidModel(_)));
    }

    #[test]
    fn test_empty_keyword_group_falls_back_to_defaults() {
        let mut raw = minimal();
        raw.keywords = Some(KeywordsConfig {
            review: Some(vec!["  ".to_string()]),
            command: Some(vec!["/fix".to_string()]),
        });
        let config = RunConfig::try_from(raw).unwrap();
        assert_eq!(config.keywords.review, vec!["/oc-review", "/opencode-review"]);
        assert_eq!(config.keywords.command, vec!["/fix"]);
    }

    #[test]
    fn test_parse_model_and_provider() {
        assert_eq!(
            parse_model_and_provider(Some("openai/gpt-4.1".to_string())),
            (Some("openai".to_string()), Some("gpt-4.1".to_string()))
        );
        assert_eq!(parse_model_and_provider(None), (None, None));
    }
}
