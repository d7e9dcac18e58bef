#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rocode_agent_client::AgentSession;
use rocode_config::{
    AgentConfig, AgentServerConfig, CommitIdentity, RepositoryCoordinates, RunConfig, RunMode,
    TriggerKeywords,
};
use rocode_devops::{
    Comment, DevOpsError, GitRepository, IdentityRef, Iteration, IterationChange, PullRequest,
    PullRequestApi, Thread, ThreadStatus,
};
use rocode_git::{CloneSpec, GitError, Vcs};
use rocode_pr::{AgentConversation, AgentLauncher, Services};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    AddComment {
        thread_id: u64,
        parent_comment_id: u64,
        content: String,
    },
    EditComment {
        thread_id: u64,
        comment_id: u64,
        content: String,
    },
    CreateThread {
        content: String,
        status: ThreadStatus,
    },
}

pub struct FakeApi {
    pub pull_request: PullRequest,
    pub threads: Vec<Thread>,
    pub calls: Mutex<Vec<ApiCall>>,
    pub fail_pull_request: bool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            pull_request: PullRequest {
                pull_request_id: 42,
                title: "Fix docs".to_string(),
                source_ref_name: "refs/heads/feature/docs".to_string(),
                target_ref_name: "refs/heads/main".to_string(),
                repository: Some(GitRepository {
                    id: "repo-1".to_string(),
                    name: "web".to_string(),
                    remote_url: Some("https://dev.azure.com/contoso/Web/_git/web".to_string()),
                }),
                ..Default::default()
            },
            threads: Vec::new(),
            calls: Mutex::new(Vec::new()),
            fail_pull_request: false,
        }
    }

    pub fn with_trigger(mut self, thread_id: u64, comment_id: u64, text: &str) -> Self {
        self.threads.push(Thread {
            id: thread_id,
            status: Some("active".to_string()),
            comments: vec![Comment {
                id: comment_id,
                content: Some(text.to_string()),
                author: Some(IdentityRef {
                    display_name: "Ada Lovelace".to_string(),
                    unique_name: Some("ada@contoso.com".to_string()),
                }),
                ..Default::default()
            }],
            ..Default::default()
        });
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PullRequestApi for FakeApi {
    async fn get_pull_request(&self, _include_commits: bool) -> rocode_devops::Result<PullRequest> {
        if self.fail_pull_request {
            return Err(DevOpsError::Status {
                method: "GET",
                endpoint: "pullRequests/42".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.pull_request.clone())
    }

    async fn list_iterations(&self) -> rocode_devops::Result<Vec<Iteration>> {
        Ok(vec![
            Iteration {
                id: 1,
                ..Default::default()
            },
            Iteration {
                id: 2,
                ..Default::default()
            },
        ])
    }

    async fn get_iteration_changes(
        &self,
        _iteration_id: u64,
    ) -> rocode_devops::Result<Vec<IterationChange>> {
        Ok(Vec::new())
    }

    async fn list_threads(&self) -> rocode_devops::Result<Vec<Thread>> {
        Ok(self.threads.clone())
    }

    async fn get_thread(&self, thread_id: u64) -> rocode_devops::Result<Thread> {
        self.threads
            .iter()
            .find(|thread| thread.id == thread_id)
            .cloned()
            .ok_or(DevOpsError::Status {
                method: "GET",
                endpoint: format!("threads/{thread_id}"),
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn add_comment(
        &self,
        thread_id: u64,
        parent_comment_id: u64,
        content: &str,
    ) -> rocode_devops::Result<Comment> {
        self.record(ApiCall::AddComment {
            thread_id,
            parent_comment_id,
            content: content.to_string(),
        });
        Ok(Comment {
            id: 100,
            parent_comment_id: Some(parent_comment_id),
            content: Some(content.to_string()),
            ..Default::default()
        })
    }

    async fn edit_comment(
        &self,
        thread_id: u64,
        comment_id: u64,
        content: &str,
    ) -> rocode_devops::Result<Comment> {
        self.record(ApiCall::EditComment {
            thread_id,
            comment_id,
            content: content.to_string(),
        });
        Ok(Comment {
            id: comment_id,
            content: Some(content.to_string()),
            ..Default::default()
        })
    }

    async fn create_thread(
        &self,
        content: &str,
        status: ThreadStatus,
    ) -> rocode_devops::Result<Thread> {
        self.record(ApiCall::CreateThread {
            content: content.to_string(),
            status,
        });
        Ok(Thread {
            id: 500,
            ..Default::default()
        })
    }
}

#[derive(Default)]
pub struct FakeVcs {
    pub fail_clone: bool,
    pub dirty: bool,
    pub clones: Mutex<Vec<(CloneSpec, PathBuf)>>,
    pub commits: Mutex<Vec<String>>,
    pub pushes: Mutex<Vec<String>>,
    pub identities: Mutex<Vec<String>>,
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn clone_branch(&self, spec: &CloneSpec, dest: &Path) -> rocode_git::Result<()> {
        std::fs::create_dir_all(dest).unwrap();
        self.clones
            .lock()
            .unwrap()
            .push((spec.clone(), dest.to_path_buf()));
        if self.fail_clone {
            return Err(GitError::Failed {
                args: format!("clone --branch {}", spec.branch),
                code: Some(128),
                stderr: "fatal: could not read from remote repository".to_string(),
            });
        }
        Ok(())
    }

    async fn configure_identity(&self, _dir: &Path, name: &str, email: &str) -> rocode_git::Result<()> {
        self.identities
            .lock()
            .unwrap()
            .push(format!("{name} <{email}>"));
        Ok(())
    }

    async fn has_uncommitted_changes(&self, _dir: &Path) -> rocode_git::Result<bool> {
        Ok(self.dirty && self.commits.lock().unwrap().is_empty())
    }

    async fn commit_all(&self, _dir: &Path, message: &str) -> rocode_git::Result<()> {
        self.commits.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn push(&self, _dir: &Path, branch: &str) -> rocode_git::Result<()> {
        self.pushes.lock().unwrap().push(branch.to_string());
        Ok(())
    }

    async fn diff_against(
        &self,
        _dir: &Path,
        _target_branch: &str,
        _file: Option<&str>,
    ) -> rocode_git::Result<String> {
        Ok(String::new())
    }
}

#[derive(Default)]
pub struct FakeLauncher {
    pub replies: Mutex<VecDeque<String>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub launches: AtomicUsize,
    pub shutdowns: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

struct FakeConversation {
    session: AgentSession,
    replies: VecDeque<String>,
    prompts: Arc<Mutex<Vec<String>>>,
    shutdowns: Arc<AtomicUsize>,
}

#[async_trait]
impl AgentLauncher for FakeLauncher {
    async fn launch(
        &self,
        _workspace: &Path,
        _agent: &AgentConfig,
    ) -> anyhow::Result<Box<dyn AgentConversation>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let replies = std::mem::take(&mut *self.replies.lock().unwrap());
        Ok(Box::new(FakeConversation {
            session: AgentSession {
                id: "ses_test".to_string(),
                title: "test".to_string(),
                version: "0.0.0".to_string(),
            },
            replies,
            prompts: self.prompts.clone(),
            shutdowns: self.shutdowns.clone(),
        }))
    }
}

#[async_trait]
impl AgentConversation for FakeConversation {
    fn session(&self) -> &AgentSession {
        &self.session
    }

    async fn prompt(&mut self, text: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(text.to_string());
        self.replies
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
    }

    async fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn run_config(workspace: &Path) -> RunConfig {
    RunConfig {
        repository: RepositoryCoordinates {
            organization_url: "https://dev.azure.com/contoso".to_string(),
            project: "Web".to_string(),
            repository_id: "repo-1".to_string(),
        },
        pull_request_id: 42,
        thread_id: None,
        comment_id: None,
        access_token: "token".to_string(),
        agent: AgentConfig {
            agent: None,
            provider_id: "anthropic".to_string(),
            model_id: "claude-sonnet-4-20250514".to_string(),
        },
        workspace: Some(workspace.to_path_buf()),
        mode: None,
        skip_clone: false,
        instructions: None,
        keywords: TriggerKeywords::default(),
        server: AgentServerConfig::default(),
        identity: CommitIdentity::default(),
    }
}

pub fn with_mode(mut config: RunConfig, mode: RunMode) -> RunConfig {
    config.mode = Some(mode);
    config
}

pub fn with_trigger(mut config: RunConfig, thread_id: u64, comment_id: u64) -> RunConfig {
    config.thread_id = Some(thread_id);
    config.comment_id = Some(comment_id);
    config
}

pub fn services(api: Arc<FakeApi>, vcs: Arc<FakeVcs>, agent: Arc<FakeLauncher>) -> Services {
    Services { api, vcs, agent }
}
