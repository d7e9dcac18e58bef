use anyhow::Context;
use rocode_config::RunMode;

use super::{final_text, RunContext, RunOutcome};
use crate::prompt::build_review_prompt;

pub(super) async fn execute(ctx: &mut RunContext<'_>) -> anyhow::Result<RunOutcome> {
    let api = ctx.services.api.clone();
    let (pr, iterations, threads) = tokio::try_join!(
        api.get_pull_request(false),
        api.list_iterations(),
        api.list_threads()
    )
    .context("failed to load pull request")?;
    let changes = ctx.latest_changes(&iterations).await;

    let workspace = ctx.prepare_workspace(&pr).await?;
    let inline = ctx.inline_context(&workspace, &pr).await;
    let request = ctx.trigger().comment_text().map(str::to_string);
    let prompt = build_review_prompt(
        request.as_deref(),
        &pr,
        &changes,
        &threads,
        inline.as_ref(),
        ctx.resolved.config.instructions.as_deref(),
    );

    ctx.start_agent(&workspace).await?;
    let response = final_text(ctx.prompt(&prompt).await?);

    Ok(RunOutcome {
        mode: RunMode::Review,
        response,
        commit: None,
    })
}
