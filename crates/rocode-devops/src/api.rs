use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Comment, Iteration, IterationChange, PullRequest, Thread, ThreadStatus};

/// The pull-request operations the run orchestrator needs. Implementations
/// are bound to a single pull request.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    async fn get_pull_request(&self, include_commits: bool) -> Result<PullRequest>;

    async fn list_iterations(&self) -> Result<Vec<Iteration>>;

    async fn get_iteration_changes(&self, iteration_id: u64) -> Result<Vec<IterationChange>>;

    async fn list_threads(&self) -> Result<Vec<Thread>>;

    async fn get_thread(&self, thread_id: u64) -> Result<Thread>;

    /// Reply to `parent_comment_id` inside `thread_id`.
    async fn add_comment(
        &self,
        thread_id: u64,
        parent_comment_id: u64,
        content: &str,
    ) -> Result<Comment>;

    async fn edit_comment(&self, thread_id: u64, comment_id: u64, content: &str)
        -> Result<Comment>;

    async fn create_thread(&self, content: &str, status: ThreadStatus) -> Result<Thread>;
}
