use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Layered configuration as read from `pr-agent.jsonc` or assembled from CLI
/// flags. Every field is optional; layers are merged before validation.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrAgentConfig {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(alias = "collectionUri", skip_serializing_if = "Option::is_none")]
    pub organization_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(alias = "repository", skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,

    #[serde(alias = "pullRequest", skip_serializing_if = "Option::is_none")]
    pub pull_request_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u64>,

    #[serde(alias = "token", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// `provider/model`, e.g. `anthropic/claude-sonnet-4-20250514`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RunMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_clone: Option<bool>,

    #[serde(alias = "prompt", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<KeywordsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeywordsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Apply the requested change and push it to the PR source branch.
    Command,
    /// Comment-only review.
    Review,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Review => "review",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunMode {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" => Ok(Self::Command),
            "review" => Ok(Self::Review),
            other => Err(crate::ConfigError::InvalidMode(other.to_string())),
        }
    }
}

trait DeepMerge {
    fn deep_merge(&mut self, other: Self);
}

fn merge_option_replace<T>(target: &mut Option<T>, source: Option<T>) {
    if let Some(value) = source {
        *target = Some(value);
    }
}

fn merge_option_deep<T: DeepMerge>(target: &mut Option<T>, source: Option<T>) {
    if let Some(source_value) = source {
        if let Some(target_value) = target {
            target_value.deep_merge(source_value);
        } else {
            *target = Some(source_value);
        }
    }
}

impl PrAgentConfig {
    /// Overlay `other` on top of `self`; values present in `other` win.
    pub fn merge(&mut self, other: PrAgentConfig) {
        merge_option_replace(&mut self.schema, other.schema);
        merge_option_replace(&mut self.organization_url, other.organization_url);
        merge_option_replace(&mut self.project, other.project);
        merge_option_replace(&mut self.repository_id, other.repository_id);
        merge_option_replace(&mut self.pull_request_id, other.pull_request_id);
        merge_option_replace(&mut self.thread_id, other.thread_id);
        merge_option_replace(&mut self.comment_id, other.comment_id);
        merge_option_replace(&mut self.access_token, other.access_token);
        merge_option_replace(&mut self.agent, other.agent);
        merge_option_replace(&mut self.model, other.model);
        merge_option_replace(&mut self.workspace, other.workspace);
        merge_option_replace(&mut self.mode, other.mode);
        merge_option_replace(&mut self.skip_clone, other.skip_clone);
        merge_option_replace(&mut self.instructions, other.instructions);
        merge_option_deep(&mut self.keywords, other.keywords);
        merge_option_deep(&mut self.server, other.server);
        merge_option_deep(&mut self.identity, other.identity);
    }
}

impl DeepMerge for KeywordsConfig {
    fn deep_merge(&mut self, other: Self) {
        merge_option_replace(&mut self.review, other.review);
        merge_option_replace(&mut self.command, other.command);
    }
}

impl DeepMerge for ServerConfig {
    fn deep_merge(&mut self, other: Self) {
        merge_option_replace(&mut self.command, other.command);
        merge_option_replace(&mut self.hostname, other.hostname);
        merge_option_replace(&mut self.port, other.port);
        merge_option_replace(&mut self.ready_interval_ms, other.ready_interval_ms);
        merge_option_replace(&mut self.ready_attempts, other.ready_attempts);
    }
}

impl DeepMerge for IdentityConfig {
    fn deep_merge(&mut self, other: Self) {
        merge_option_replace(&mut self.name, other.name);
        merge_option_replace(&mut self.email, other.email);
    }
}
