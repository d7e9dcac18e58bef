use serde::{Deserialize, Serialize};

/// Coordinates of one pull request; every API call is keyed by these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub organization_url: String,
    pub project: String,
    pub repository_id: String,
    pub pull_request_id: u64,
}

impl PullRequestRef {
    /// HTTPS clone URL for the repository, used when the PR payload has none.
    pub fn clone_url(&self) -> String {
        format!(
            "{}/{}/_git/{}",
            self.organization_url.trim_end_matches('/'),
            self.project.replace(' ', "%20"),
            self.repository_id
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unique_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitRepository {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitRef {
    #[serde(default)]
    pub commit_id: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub pull_request_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_ref_name: String,
    #[serde(default)]
    pub target_ref_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<IdentityRef>,
    #[serde(default)]
    pub repository: Option<GitRepository>,
    #[serde(default)]
    pub commits: Option<Vec<GitCommitRef>>,
}

fn branch_name(ref_name: &str) -> &str {
    ref_name.strip_prefix("refs/heads/").unwrap_or(ref_name)
}

impl PullRequest {
    pub fn source_branch(&self) -> &str {
        branch_name(&self.source_ref_name)
    }

    pub fn target_branch(&self) -> &str {
        branch_name(&self.target_ref_name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_ref_commit: Option<GitCommitRef>,
    #[serde(default)]
    pub target_ref_commit: Option<GitCommitRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IterationChange {
    #[serde(default)]
    pub change_tracking_id: Option<u64>,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub item: Option<ChangeItem>,
}

impl IterationChange {
    pub fn path(&self) -> Option<&str> {
        self.item.as_ref().and_then(|item| item.path.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilePosition {
    pub line: u32,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ThreadContext {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub right_file_start: Option<FilePosition>,
    #[serde(default)]
    pub right_file_end: Option<FilePosition>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub parent_comment_id: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<IdentityRef>,
    #[serde(default)]
    pub comment_type: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub thread_context: Option<ThreadContext>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Thread {
    pub fn comment(&self, comment_id: u64) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// File path and right-side line the thread is anchored to, if any.
    pub fn file_anchor(&self) -> Option<(&str, Option<u32>)> {
        let context = self.thread_context.as_ref()?;
        let path = context.file_path.as_deref()?;
        Some((path, context.right_file_start.map(|p| p.line)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThreadStatus {
    Active,
    Fixed,
    Closed,
}

/// Azure DevOps list envelope: `{ "count": n, "value": [...] }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IterationChangesResponse {
    #[serde(default)]
    pub change_entries: Vec<IterationChange>,
}
