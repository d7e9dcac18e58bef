use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod run;

use cli::*;
use run::{resolve_mode, run_agent};

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env("ROCODE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(log_file: Option<&std::path::Path>) {
    if let Some(path) = log_file {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).ok();
        }
        match std::fs::File::create(path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(log_filter())
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .init();
                return;
            }
            Err(error) => eprintln!("cannot open log file {}: {error}", path.display()),
        }
    }
    // Agent progress goes to stdout, so logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref());

    match cli.command {
        Commands::Run(args) => run_agent(args).await?,
        Commands::Resolve(args) => resolve_mode(args).await?,
        Commands::Version => {
            println!("rocode-pr {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
