//! Pull-request agent runs: trigger resolution, workspace and agent
//! lifecycle, and the feedback posted back to the pull request.

pub mod agent;
pub mod context;
pub mod feedback;
pub mod prompt;
pub mod runner;
pub mod trigger;
pub mod util;
pub mod workspace;

pub use agent::{AgentConversation, AgentLauncher, OpencodeLauncher};
pub use context::{load_trigger_context, ResolvedRunConfig, TriggerContext};
pub use feedback::{Feedback, SUMMARY_HEADER, WORKING_MESSAGE};
pub use runner::{pull_request_ref, resolve, run, RunError, RunOutcome, Services};
pub use trigger::{TriggerError, TriggerResolver};
pub use workspace::{Workspace, WorkspaceManager};
