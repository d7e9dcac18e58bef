//! Client for a locally spawned opencode-compatible agent server: process
//! lifecycle, readiness polling, sessions, prompts and the progress stream.

pub mod client;
pub mod error;
pub mod events;
pub mod process;
pub mod types;

pub use client::{AgentClient, ReadinessPolicy};
pub use error::{AgentClientError, Result};
pub use events::{parse_event_data, tool_label, AgentEvent, EventStreamHandle};
pub use process::{AgentServer, AgentServerOptions};
pub use types::{AgentInfo, AgentSession, ModelSelection};
