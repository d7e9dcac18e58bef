#[derive(Debug, thiserror::Error)]
pub enum DevOpsError {
    #[error("Azure DevOps request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Azure DevOps returned {status} for {method} {endpoint}: {body}")]
    Status {
        method: &'static str,
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("invalid Azure DevOps URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to decode Azure DevOps response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("comment {comment_id} not found in thread {thread_id}")]
    CommentNotFound { thread_id: u64, comment_id: u64 },
}

pub type Result<T> = std::result::Result<T, DevOpsError>;
