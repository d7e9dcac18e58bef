use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::PullRequestApi;
use crate::error::{DevOpsError, Result};
use crate::types::{
    Comment, Iteration, IterationChange, IterationChangesResponse, ListResponse, PullRequest,
    PullRequestRef, Thread, ThreadStatus,
};

const API_VERSION: &str = "7.1";

/// REST client for the Git pull-request endpoints of Azure DevOps.
#[derive(Clone)]
pub struct AzureDevOpsClient {
    http: reqwest::Client,
    token: String,
    pr: PullRequestRef,
}

impl AzureDevOpsClient {
    pub fn new(pr: PullRequestRef, token: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), pr, token)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        pr: PullRequestRef,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token: token.into(),
            pr,
        }
    }

    pub fn pull_request_ref(&self) -> &PullRequestRef {
        &self.pr
    }

    /// `{org}/{project}/_apis/git/repositories/{repo}/pullRequests/{id}/{suffix..}`
    fn endpoint(&self, suffix: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let base = format!("{}/", self.pr.organization_url.trim_end_matches('/'));
        let mut url = Url::parse(&base)?;
        let pr_id = self.pr.pull_request_id.to_string();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.pop_if_empty();
            segments.extend([
                self.pr.project.as_str(),
                "_apis",
                "git",
                "repositories",
                self.pr.repository_id.as_str(),
                "pullRequests",
                pr_id.as_str(),
            ]);
            segments.extend(suffix);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("api-version", API_VERSION);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &'static str,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let endpoint = url.path().to_string();
        let mut request = match method {
            "POST" => self.http.post(url),
            "PATCH" => self.http.patch(url),
            _ => self.http.get(url),
        }
        .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        tracing::debug!(method, %endpoint, "azure devops request");
        let response = request.send().await?;
        parse_http_json(method, endpoint, response).await
    }
}

async fn parse_http_json<T: DeserializeOwned>(
    method: &'static str,
    endpoint: String,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(DevOpsError::Status {
            method,
            endpoint,
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl PullRequestApi for AzureDevOpsClient {
    async fn get_pull_request(&self, include_commits: bool) -> Result<PullRequest> {
        let include = if include_commits { "true" } else { "false" };
        let url = self.endpoint(&[], &[("includeCommits", include)])?;
        self.send("GET", url, None).await
    }

    async fn list_iterations(&self) -> Result<Vec<Iteration>> {
        let url = self.endpoint(&["iterations"], &[])?;
        let list: ListResponse<Iteration> = self.send("GET", url, None).await?;
        Ok(list.value)
    }

    async fn get_iteration_changes(&self, iteration_id: u64) -> Result<Vec<IterationChange>> {
        let iteration = iteration_id.to_string();
        let url = self.endpoint(&["iterations", &iteration, "changes"], &[])?;
        let changes: IterationChangesResponse = self.send("GET", url, None).await?;
        Ok(changes.change_entries)
    }

    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let url = self.endpoint(&["threads"], &[])?;
        let list: ListResponse<Thread> = self.send("GET", url, None).await?;
        Ok(list.value)
    }

    async fn get_thread(&self, thread_id: u64) -> Result<Thread> {
        let thread = thread_id.to_string();
        let url = self.endpoint(&["threads", &thread], &[])?;
        self.send("GET", url, None).await
    }

    async fn add_comment(
        &self,
        thread_id: u64,
        parent_comment_id: u64,
        content: &str,
    ) -> Result<Comment> {
        let thread = thread_id.to_string();
        let url = self.endpoint(&["threads", &thread, "comments"], &[])?;
        let body = serde_json::json!({
            "content": content,
            "parentCommentId": parent_comment_id,
            "commentType": 1
        });
        self.send("POST", url, Some(body)).await
    }

    async fn edit_comment(
        &self,
        thread_id: u64,
        comment_id: u64,
        content: &str,
    ) -> Result<Comment> {
        let thread = thread_id.to_string();
        let comment = comment_id.to_string();
        let url = self.endpoint(&["threads", &thread, "comments", &comment], &[])?;
        self.send("PATCH", url, Some(serde_json::json!({ "content": content })))
            .await
    }

    async fn create_thread(&self, content: &str, status: ThreadStatus) -> Result<Thread> {
        let url = self.endpoint(&["threads"], &[])?;
        let body = serde_json::json!({
            "comments": [{
                "parentCommentId": 0,
                "content": content,
                "commentType": 1
            }],
            "status": status
        });
        self.send("POST", url, Some(body)).await
    }
}
