use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rocode-pr")]
#[command(about = "Run an OpenCode agent against an Azure DevOps pull request", long_about = None)]
pub(crate) struct Cli {
    /// Write logs to this file instead of stderr.
    #[arg(long = "log-file", global = true, env = "ROCODE_LOG_FILE")]
    pub(crate) log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    #[command(about = "Run the agent for one pull request trigger")]
    Run(RunArgs),
    #[command(about = "Resolve the run mode without touching the pull request")]
    Resolve(RunArgs),
    #[command(about = "Show version")]
    Version,
}

/// Run inputs. Each flag falls back to the matching Azure Pipelines variable.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct RunArgs {
    /// JSONC config file (defaults to `.rocode/pr-agent.jsonc`).
    #[arg(long, env = "ROCODE_PR_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long = "organization-url", env = "SYSTEM_COLLECTIONURI")]
    pub(crate) organization_url: Option<String>,
    #[arg(long, env = "SYSTEM_TEAMPROJECT")]
    pub(crate) project: Option<String>,
    #[arg(long = "repository-id", env = "BUILD_REPOSITORY_ID")]
    pub(crate) repository_id: Option<String>,
    #[arg(long = "pr", env = "SYSTEM_PULLREQUEST_PULLREQUESTID")]
    pub(crate) pull_request_id: Option<u64>,
    #[arg(long = "thread-id", env = "ROCODE_THREAD_ID")]
    pub(crate) thread_id: Option<u64>,
    #[arg(long = "comment-id", env = "ROCODE_COMMENT_ID")]
    pub(crate) comment_id: Option<u64>,
    #[arg(long, env = "SYSTEM_ACCESSTOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,
    /// `provider/model`.
    #[arg(short = 'm', long, env = "ROCODE_MODEL")]
    pub(crate) model: Option<String>,
    #[arg(long, env = "ROCODE_AGENT")]
    pub(crate) agent: Option<String>,
    /// `command` or `review`; inferred from the trigger comment when omitted.
    #[arg(long, env = "ROCODE_MODE")]
    pub(crate) mode: Option<String>,
    #[arg(long, env = "ROCODE_WORKSPACE")]
    pub(crate) workspace: Option<PathBuf>,
    /// Use `--workspace` as an existing checkout instead of cloning.
    #[arg(long = "skip-clone", env = "ROCODE_SKIP_CLONE", default_value_t = false)]
    pub(crate) skip_clone: bool,
    /// Extra instructions appended to the prompt.
    #[arg(long, env = "ROCODE_PROMPT")]
    pub(crate) prompt: Option<String>,
    #[arg(long, env = "ROCODE_AGENT_PORT")]
    pub(crate) port: Option<u16>,
}
