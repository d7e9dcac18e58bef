use rocode_config::{RunConfig, RunMode};
use rocode_devops::{Comment, DevOpsError, PullRequestApi, Thread};

use crate::trigger::{TriggerError, TriggerResolver};

/// The thread and comment that activated the run. Empty for headless runs.
#[derive(Debug, Clone, Default)]
pub struct TriggerContext {
    pub thread: Option<Thread>,
    pub comment: Option<Comment>,
}

impl TriggerContext {
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn is_comment_activated(&self) -> bool {
        self.thread.is_some() && self.comment.is_some()
    }

    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_ref().and_then(|c| c.content.as_deref())
    }

    /// `(thread_id, comment_id)` of the trigger comment.
    pub fn ids(&self) -> Option<(u64, u64)> {
        Some((self.thread.as_ref()?.id, self.comment.as_ref()?.id))
    }

    /// Unique name of the comment author when it looks like an e-mail address.
    pub fn author_email(&self) -> Option<(&str, &str)> {
        let author = self.comment.as_ref()?.author.as_ref()?;
        let unique = author.unique_name.as_deref()?.trim();
        if !unique.contains('@') {
            return None;
        }
        let name = if author.display_name.trim().is_empty() {
            unique
        } else {
            author.display_name.trim()
        };
        Some((name, unique))
    }

    /// File path (without the leading `/`) and line the thread is anchored to.
    pub fn file_anchor(&self) -> Option<(&str, Option<u32>)> {
        let (path, line) = self.thread.as_ref()?.file_anchor()?;
        let path = path.trim_start_matches('/');
        (!path.is_empty()).then_some((path, line))
    }
}

/// Fetch the trigger thread and comment named by the configuration.
pub async fn load_trigger_context(
    api: &dyn PullRequestApi,
    config: &RunConfig,
) -> Result<TriggerContext, DevOpsError> {
    let Some((thread_id, comment_id)) = config.trigger_ids() else {
        return Ok(TriggerContext::headless());
    };

    let thread = api.get_thread(thread_id).await?;
    let comment = thread
        .comment(comment_id)
        .cloned()
        .ok_or(DevOpsError::CommentNotFound {
            thread_id,
            comment_id,
        })?;
    tracing::debug!(thread_id, comment_id, "loaded trigger comment");

    Ok(TriggerContext {
        thread: Some(thread),
        comment: Some(comment),
    })
}

/// A run configuration with its mode settled.
#[derive(Debug, Clone)]
pub struct ResolvedRunConfig {
    pub config: RunConfig,
    pub mode: RunMode,
    pub trigger: TriggerContext,
    pub mode_explicit: bool,
}

impl ResolvedRunConfig {
    pub fn resolve(config: RunConfig, trigger: TriggerContext) -> Result<Self, TriggerError> {
        let resolver = TriggerResolver::new(config.keywords.clone());
        let comment = if trigger.is_comment_activated() {
            Some(trigger.comment_text().unwrap_or_default())
        } else {
            None
        };
        let (mode, mode_explicit) = resolver.resolve(config.mode, comment)?;
        Ok(Self {
            config,
            mode,
            trigger,
            mode_explicit,
        })
    }

    pub fn is_headless(&self) -> bool {
        !self.trigger.is_comment_activated()
    }
}
