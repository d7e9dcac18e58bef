//! Run orchestration: resolve the trigger, announce, run the mode, finalize
//! on the pull request and tear everything down.

mod command;
mod review;

use std::sync::Arc;

use anyhow::Context;
use rocode_config::{RunConfig, RunMode};
use rocode_devops::{Iteration, IterationChange, PullRequest, PullRequestApi, PullRequestRef};
use rocode_git::{CloneSpec, Vcs};

use crate::agent::{AgentConversation, AgentLauncher};
use crate::context::{load_trigger_context, ResolvedRunConfig, TriggerContext};
use crate::feedback::{failure_message, Feedback};
use crate::prompt::InlineContext;
use crate::trigger::TriggerError;
use crate::util::{pipeline_footer, warn_missing_provider_credentials};
use crate::workspace::{Workspace, WorkspaceManager};

/// Text posted when the agent finished without any text reply.
const EMPTY_RESPONSE: &str = "_The agent finished without a reply._";

/// External edges a run talks to.
#[derive(Clone)]
pub struct Services {
    pub api: Arc<dyn PullRequestApi>,
    pub vcs: Arc<dyn Vcs>,
    pub agent: Arc<dyn AgentLauncher>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub mode: RunMode,
    /// Final agent text as posted to the pull request.
    pub response: String,
    /// Commit subject, when changes were pushed.
    pub commit: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Rejected before any pull-request side effect.
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    /// Failed after the run started; the failure was reported on the PR.
    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl RunError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Trigger(_))
    }
}

fn final_text(reply: String) -> String {
    if reply.trim().is_empty() {
        EMPTY_RESPONSE.to_string()
    } else {
        reply
    }
}

pub fn pull_request_ref(config: &RunConfig) -> PullRequestRef {
    PullRequestRef {
        organization_url: config.repository.organization_url.clone(),
        project: config.repository.project.clone(),
        repository_id: config.repository.repository_id.clone(),
        pull_request_id: config.pull_request_id,
    }
}

/// Fetch the trigger context and settle the mode without side effects.
pub async fn resolve(
    config: RunConfig,
    api: &dyn PullRequestApi,
) -> anyhow::Result<ResolvedRunConfig> {
    let trigger = load_trigger_context(api, &config)
        .await
        .context("failed to load trigger comment")?;
    Ok(ResolvedRunConfig::resolve(config, trigger)?)
}

/// Run one invocation end to end.
///
/// Trigger errors are returned before anything is posted. Every later failure
/// is reported on the pull request exactly once, and teardown always runs.
pub async fn run(config: RunConfig, services: &Services) -> Result<RunOutcome, RunError> {
    let footer = pipeline_footer();

    let trigger = match load_trigger_context(services.api.as_ref(), &config).await {
        Ok(trigger) => trigger,
        Err(error) => {
            let error = anyhow::Error::new(error).context("failed to load trigger comment");
            Feedback::new(services.api.clone(), None, footer)
                .fail(&failure_message(&error))
                .await;
            return Err(RunError::Failed(error));
        }
    };

    let resolved = ResolvedRunConfig::resolve(config, trigger)?;
    tracing::info!(
        pr_id = resolved.config.pull_request_id,
        mode = %resolved.mode,
        explicit = resolved.mode_explicit,
        headless = resolved.is_headless(),
        "starting run"
    );

    let mut feedback = Feedback::new(services.api.clone(), resolved.trigger.ids(), footer);
    let mut ctx = RunContext::new(resolved, services);

    let result = drive(&mut ctx, &mut feedback).await;
    let result = match result {
        Ok(outcome) => match feedback.succeed(&outcome.response).await {
            Ok(()) => Ok(outcome),
            Err(error) => Err(error.context("failed to post the result")),
        },
        Err(error) => Err(error),
    };
    if let Err(error) = &result {
        tracing::error!(error = %format!("{error:#}"), "run failed");
        feedback.fail(&failure_message(error)).await;
    }

    ctx.teardown().await;
    result.map_err(RunError::Failed)
}

async fn drive(ctx: &mut RunContext<'_>, feedback: &mut Feedback) -> anyhow::Result<RunOutcome> {
    feedback
        .announce()
        .await
        .context("failed to acknowledge the trigger comment")?;
    match ctx.resolved.mode {
        RunMode::Command => command::execute(ctx).await,
        RunMode::Review => review::execute(ctx).await,
    }
}

/// Per-run state. Anything acquired is recorded here so teardown can find it.
pub(crate) struct RunContext<'a> {
    resolved: ResolvedRunConfig,
    services: &'a Services,
    workspaces: WorkspaceManager,
    workspace: Option<Workspace>,
    agent: Option<Box<dyn AgentConversation>>,
}

impl<'a> RunContext<'a> {
    fn new(resolved: ResolvedRunConfig, services: &'a Services) -> Self {
        let workspaces =
            WorkspaceManager::new(services.vcs.clone(), resolved.config.workspace_root());
        Self {
            resolved,
            services,
            workspaces,
            workspace: None,
            agent: None,
        }
    }

    fn api(&self) -> &dyn PullRequestApi {
        self.services.api.as_ref()
    }

    fn trigger(&self) -> &TriggerContext {
        &self.resolved.trigger
    }

    /// Changed paths of the latest iteration. Missing data only thins the prompt.
    async fn latest_changes(&self, iterations: &[Iteration]) -> Vec<IterationChange> {
        let Some(latest) = iterations.iter().map(|it| it.id).max() else {
            return Vec::new();
        };
        match self.api().get_iteration_changes(latest).await {
            Ok(changes) => changes,
            Err(error) => {
                tracing::warn!(%error, iteration = latest, "could not list changed files");
                Vec::new()
            }
        }
    }

    async fn prepare_workspace(&mut self, pr: &PullRequest) -> anyhow::Result<Workspace> {
        let config = &self.resolved.config;
        let workspace = self.workspaces.plan(
            config.skip_clone,
            config.workspace.as_deref(),
            &config.repository.repository_id,
        )?;
        self.workspace = Some(workspace.clone());

        let url = pr
            .repository
            .as_ref()
            .and_then(|repo| repo.remote_url.clone())
            .unwrap_or_else(|| pull_request_ref(config).clone_url());
        let spec = CloneSpec::new(url, pr.source_branch());
        self.workspaces.acquire(&workspace, &spec).await?;
        Ok(workspace)
    }

    /// Diff context for a trigger thread anchored to a file.
    async fn inline_context(&self, workspace: &Workspace, pr: &PullRequest) -> Option<InlineContext> {
        let (file, line) = self.trigger().file_anchor()?;
        let diff_hunk = match self
            .workspaces
            .diff_hunk(workspace, pr.target_branch(), file, line)
            .await
        {
            Ok(hunk) => hunk,
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), file, "no diff context for thread");
                String::new()
            }
        };
        Some(InlineContext {
            file: file.to_string(),
            line,
            diff_hunk,
        })
    }

    async fn start_agent(&mut self, workspace: &Workspace) -> anyhow::Result<()> {
        let agent = &self.resolved.config.agent;
        warn_missing_provider_credentials(&agent.provider_id);
        let conversation = self
            .services
            .agent
            .launch(&workspace.path, agent)
            .await
            .context("failed to start the agent")?;
        tracing::info!(session_id = %conversation.session().id, "agent started");
        self.agent = Some(conversation);
        Ok(())
    }

    async fn prompt(&mut self, text: &str) -> anyhow::Result<String> {
        let agent = self
            .agent
            .as_mut()
            .context("agent is not running")?;
        agent.prompt(text).await
    }

    /// Stop the agent, then remove the workspace. Safe to call repeatedly.
    async fn teardown(&mut self) {
        if let Some(mut agent) = self.agent.take() {
            agent.shutdown().await;
        }
        if let Some(workspace) = self.workspace.as_mut() {
            self.workspaces.release(workspace).await;
        }
    }
}
