use std::sync::Arc;

use rocode_devops::{PullRequestApi, ThreadStatus};

/// Placeholder reply posted while the agent works.
pub const WORKING_MESSAGE: &str = "🤖 OpenCode is working on it…";
/// Heading of the closed thread a headless run leaves behind.
pub const SUMMARY_HEADER: &str = "## 🤖 OpenCode Review Summary";

/// PR-visible side of a run: acknowledge, then finalize once.
///
/// Comment-activated runs reply to the trigger comment and later edit that
/// reply. Headless runs, and runs whose reply could not be posted, finalize
/// with a new closed thread.
pub struct Feedback {
    api: Arc<dyn PullRequestApi>,
    trigger: Option<(u64, u64)>,
    reply: Option<(u64, u64)>,
    footer: String,
    delivered: bool,
}

impl Feedback {
    pub fn new(api: Arc<dyn PullRequestApi>, trigger: Option<(u64, u64)>, footer: String) -> Self {
        Self {
            api,
            trigger,
            reply: None,
            footer,
            delivered: false,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Reply to the trigger comment. No-op for headless runs.
    pub async fn announce(&mut self) -> anyhow::Result<()> {
        let Some((thread_id, comment_id)) = self.trigger else {
            return Ok(());
        };
        let reply = self
            .api
            .add_comment(thread_id, comment_id, WORKING_MESSAGE)
            .await?;
        tracing::debug!(thread_id, reply_id = reply.id, "posted working reply");
        self.reply = Some((thread_id, reply.id));
        Ok(())
    }

    pub async fn succeed(&mut self, text: &str) -> anyhow::Result<()> {
        if self.delivered {
            return Ok(());
        }
        match self.reply {
            Some((thread_id, reply_id)) => {
                let content = format!("{}{}", text.trim(), self.footer);
                self.api.edit_comment(thread_id, reply_id, &content).await?;
            }
            None => {
                let content = format!("{}\n\n{}{}", SUMMARY_HEADER, text.trim(), self.footer);
                self.api.create_thread(&content, ThreadStatus::Closed).await?;
            }
        }
        self.delivered = true;
        Ok(())
    }

    /// Deliver a failure message. Best effort: delivery problems are logged.
    pub async fn fail(&mut self, message: &str) {
        if self.delivered {
            return;
        }
        self.delivered = true;
        let content = format!("{}{}", message, self.footer);
        let result = match self.reply {
            Some((thread_id, reply_id)) => self
                .api
                .edit_comment(thread_id, reply_id, &content)
                .await
                .map(|_| ()),
            None => self
                .api
                .create_thread(&content, ThreadStatus::Closed)
                .await
                .map(|_| ()),
        };
        if let Err(error) = result {
            tracing::error!(%error, "failed to report run failure on the pull request");
        }
    }
}

/// Failure text posted to the pull request.
pub fn failure_message(error: &anyhow::Error) -> String {
    format!("❌ OpenCode run failed:\n\n```\n{:#}\n```", error)
}
