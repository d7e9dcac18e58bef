use anyhow::Context;
use rocode_config::RunMode;

use super::{final_text, RunContext, RunOutcome};
use crate::prompt::{build_command_prompt, build_summary_prompt};
use crate::util::{commit_message, summary_title};

pub(super) async fn execute(ctx: &mut RunContext<'_>) -> anyhow::Result<RunOutcome> {
    let request = ctx
        .trigger()
        .comment_text()
        .context("command mode requires a trigger comment")?
        .to_string();

    let api = ctx.services.api.clone();
    let (pr, iterations) = tokio::try_join!(api.get_pull_request(true), api.list_iterations())
        .context("failed to load pull request")?;
    let changes = ctx.latest_changes(&iterations).await;

    let workspace = ctx.prepare_workspace(&pr).await?;
    let inline = ctx.inline_context(&workspace, &pr).await;
    let prompt = build_command_prompt(
        &request,
        &pr,
        &changes,
        inline.as_ref(),
        ctx.resolved.config.instructions.as_deref(),
    );

    ctx.start_agent(&workspace).await?;
    let response = final_text(ctx.prompt(&prompt).await?);

    if !ctx.workspaces.has_changes(&workspace).await? {
        tracing::info!("agent made no changes");
        return Ok(RunOutcome {
            mode: RunMode::Command,
            response,
            commit: None,
        });
    }

    let fallback = format!("Apply changes requested in PR #{}", pr.pull_request_id);
    let summary = match ctx.prompt(&build_summary_prompt()).await {
        Ok(reply) => summary_title(&reply, &fallback),
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "commit summary prompt failed");
            summary_title("", &fallback)
        }
    };
    let message = commit_message(&summary, ctx.trigger().author_email());

    let branch = pr.source_branch().to_string();
    ctx.workspaces
        .configure_identity(&workspace, &ctx.resolved.config.identity)
        .await?;
    ctx.workspaces
        .commit_and_push(&workspace, &message, &branch)
        .await?;
    tracing::info!(branch = %branch, summary = %summary, "pushed agent changes");

    Ok(RunOutcome {
        mode: RunMode::Command,
        response: format!("{}\n\nPushed `{}` to `{}`.", response.trim_end(), summary, branch),
        commit: Some(summary),
    })
}
