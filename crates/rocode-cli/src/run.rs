use std::sync::Arc;

use anyhow::Context;
use rocode_config::{load_config, PrAgentConfig, RunConfig, RunMode, ServerConfig};
use rocode_devops::AzureDevOpsClient;
use rocode_git::GitCli;
use rocode_pr::{pull_request_ref, OpencodeLauncher, Services};

use crate::cli::RunArgs;

impl RunArgs {
    /// Flags as the top configuration layer.
    fn overlay(&self) -> anyhow::Result<PrAgentConfig> {
        let mode = self
            .mode
            .as_deref()
            .filter(|mode| !mode.trim().is_empty())
            .map(str::parse::<RunMode>)
            .transpose()?;
        Ok(PrAgentConfig {
            organization_url: self.organization_url.clone(),
            project: self.project.clone(),
            repository_id: self.repository_id.clone(),
            pull_request_id: self.pull_request_id,
            thread_id: self.thread_id,
            comment_id: self.comment_id,
            access_token: self.token.clone(),
            agent: self.agent.clone(),
            model: self.model.clone(),
            workspace: self.workspace.clone(),
            mode,
            skip_clone: self.skip_clone.then_some(true),
            instructions: self.prompt.clone(),
            server: self.port.map(|port| ServerConfig {
                port: Some(port),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

pub(crate) fn load_run_config(args: &RunArgs) -> anyhow::Result<RunConfig> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let mut loader = load_config(args.config.as_deref(), &cwd)?;
    for path in loader.config_paths() {
        tracing::info!(path = %path.display(), "using config file");
    }
    loader.overlay(args.overlay()?);
    Ok(RunConfig::try_from(loader.build())?)
}

fn build_services(config: &RunConfig) -> anyhow::Result<Services> {
    GitCli::ensure_available()?;
    let api = AzureDevOpsClient::new(pull_request_ref(config), config.access_token.clone());
    let vcs = GitCli::new().with_bearer_token(config.access_token.clone());
    Ok(Services {
        api: Arc::new(api),
        vcs: Arc::new(vcs),
        agent: Arc::new(OpencodeLauncher::new(config.server.clone())),
    })
}

pub(crate) async fn run_agent(args: RunArgs) -> anyhow::Result<()> {
    let config = load_run_config(&args)?;
    let services = build_services(&config)?;
    let outcome = rocode_pr::run(config, &services).await?;
    println!("{}", outcome.response);
    Ok(())
}

pub(crate) async fn resolve_mode(args: RunArgs) -> anyhow::Result<()> {
    let config = load_run_config(&args)?;
    let api = AzureDevOpsClient::new(pull_request_ref(&config), config.access_token.clone());
    let resolved = rocode_pr::resolve(config, &api).await?;
    println!(
        "mode: {} ({})",
        resolved.mode,
        if resolved.mode_explicit {
            "explicit"
        } else {
            "from trigger comment"
        }
    );
    if let Some(text) = resolved.trigger.comment_text() {
        println!("trigger: {}", text.trim());
    }
    Ok(())
}
