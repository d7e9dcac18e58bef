use serde::{Deserialize, Serialize};

/// One conversation with the agent server, scoped to a single run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentSession {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    /// `primary`, `subagent` or `all`.
    #[serde(default)]
    pub mode: Option<String>,
}

impl AgentInfo {
    pub fn is_primary(&self) -> bool {
        matches!(self.mode.as_deref(), None | Some("primary") | Some("all"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSelection {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    #[serde(rename = "modelID")]
    pub model_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PromptRequest<'a> {
    pub model: &'a ModelSelection,
    /// Omitted so the server picks its default agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<&'a str>,
    pub parts: Vec<PromptPart<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PromptPart<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PromptResponse {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl PromptResponse {
    /// Text of the last `text` part; responses interleave tool and text parts.
    pub fn final_text(&self) -> String {
        self.parts
            .iter()
            .rev()
            .find(|part| part.kind == "text")
            .and_then(|part| part.text.clone())
            .unwrap_or_default()
    }
}
