//! Agent server event stream (`GET /event`, `text/event-stream`).
//!
//! The stream is for progress visibility only: parse failures and unknown
//! event shapes are dropped and never surface as errors.

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tool name → short display label.
const TOOL_LABELS: &[(&str, &str)] = &[
    ("bash", "Bash"),
    ("edit", "Edit"),
    ("multiedit", "Edit"),
    ("write", "Write"),
    ("read", "Read"),
    ("glob", "Glob"),
    ("grep", "Grep"),
    ("list", "List"),
    ("patch", "Patch"),
    ("apply_patch", "Patch"),
    ("task", "Task"),
    ("todowrite", "Todo"),
    ("todoread", "Todo"),
    ("webfetch", "Fetch"),
    ("websearch", "Search"),
];

pub fn tool_label(tool: &str) -> &str {
    TOOL_LABELS
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, label)| *label)
        .unwrap_or(tool)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// A tool invocation finished.
    ToolCompleted { tool: String, title: String },
    /// A text segment was finalized.
    TextFinished { text: String },
    SessionUpdated { session_id: String },
    Other,
}

impl AgentEvent {
    /// One printable line for the pipeline log, if the event is rendered.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::ToolCompleted { tool, title } => {
                Some(format!("|  {:<7} {}", tool_label(tool), title))
            }
            Self::TextFinished { text } => {
                let text = text.trim();
                (!text.is_empty()).then(|| format!("\n{text}\n"))
            }
            Self::SessionUpdated { .. } | Self::Other => None,
        }
    }
}

/// Parse the JSON payload of one `data:` line. Returns `None` for events that
/// belong to another session or cannot be parsed.
pub fn parse_event_data(data: &str, session_id: &str) -> Option<AgentEvent> {
    let value: Value = serde_json::from_str(data).ok()?;
    let event_type = value.get("type")?.as_str()?;
    let properties = value.get("properties")?;

    match event_type {
        "message.part.updated" => {
            let part = properties.get("part")?;
            if part.get("sessionID")?.as_str()? != session_id {
                return None;
            }
            Some(parse_part(part))
        }
        "session.updated" => {
            let id = properties.get("info")?.get("id")?.as_str()?;
            if id != session_id {
                return None;
            }
            Some(AgentEvent::SessionUpdated {
                session_id: id.to_string(),
            })
        }
        _ => Some(AgentEvent::Other),
    }
}

fn parse_part(part: &Value) -> AgentEvent {
    match part.get("type").and_then(Value::as_str) {
        Some("tool") => {
            let Some(state) = part.get("state") else {
                return AgentEvent::Other;
            };
            if state.get("status").and_then(Value::as_str) != Some("completed") {
                return AgentEvent::Other;
            }
            let tool = part
                .get("tool")
                .and_then(Value::as_str)
                .unwrap_or("tool")
                .to_string();
            let title = state
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    state
                        .get("input")
                        .map(Value::to_string)
                        .unwrap_or_else(|| "{}".to_string())
                });
            AgentEvent::ToolCompleted { tool, title }
        }
        Some("text") => {
            let finished = part
                .get("time")
                .and_then(|time| time.get("end"))
                .map(|end| !end.is_null())
                .unwrap_or(false);
            if !finished {
                return AgentEvent::Other;
            }
            AgentEvent::TextFinished {
                text: part
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
        }
        _ => AgentEvent::Other,
    }
}

/// Handle to the background reader. Dropping or stopping it cancels the
/// reader without waiting for it to exit.
pub struct EventStreamHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl EventStreamHandle {
    pub(crate) fn spawn(response: reqwest::Response, session_id: String) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = consume_events(response.bytes_stream(), &session_id, |event| {
                    if let Some(line) = event.render() {
                        println!("{line}");
                    }
                }) => {}
            }
            tracing::debug!(session_id = %session_id, "agent event reader stopped");
        });
        Self {
            cancel,
            task: Some(task),
        }
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        // Detach; the reader exits on its own once cancelled or the socket closes.
        self.task.take();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for EventStreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Read SSE frames in arrival order and hand each session event to `on_event`.
///
/// Bytes are buffered until a full line arrives, so multi-byte characters
/// split across chunks decode intact.
pub async fn consume_events<S, B, E, F>(stream: S, session_id: &str, mut on_event: F)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    F: FnMut(AgentEvent),
{
    futures::pin_mut!(stream);
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                tracing::debug!(%error, "agent event stream closed");
                break;
            }
        };
        buffer.extend_from_slice(chunk.as_ref());

        while let Some(pos) = buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            handle_line(&line, session_id, &mut on_event);
        }
    }
}

fn handle_line<F>(raw: &[u8], session_id: &str, on_event: &mut F)
where
    F: FnMut(AgentEvent),
{
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\n', '\r']);
    if let Some(data) = line.strip_prefix("data:") {
        if let Some(event) = parse_event_data(data.trim_start(), session_id) {
            on_event(event);
        }
    }
}
