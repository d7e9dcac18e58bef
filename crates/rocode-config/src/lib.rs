//! Configuration for a single pull-request agent run.
//!
//! Values are layered: project file (`.rocode/pr-agent.jsonc`), then an
//! explicit config file, then CLI flags / pipeline variables. The merged
//! [`PrAgentConfig`] is validated into an immutable [`RunConfig`].

pub mod loader;
pub mod run_config;
pub mod schema;

pub use loader::{load_config, ConfigLoader};
pub use run_config::{
    parse_model_and_provider, AgentConfig, AgentServerConfig, CommitIdentity,
    RepositoryCoordinates, RunConfig, TriggerKeywords,
};
pub use schema::{
    IdentityConfig, KeywordsConfig, PrAgentConfig, RunMode, ServerConfig,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    MissingField(&'static str),

    #[error("thread id and comment id must be provided together")]
    IncompleteTrigger,

    #[error("model must be `provider/model`, got `{0}`")]
    InvalidModel(String),

    #[error("unknown mode `{0}` (expected `command` or `review`)")]
    InvalidMode(String),
}
