//! cherry-sync CLI

mod cli;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cherry-sync")]
#[command(about = "Cherry-pick upstream documentation commits into a translation repository")]
#[command(version)]
struct Cli {
    /// Configuration file (default: cherry-sync.toml)
    #[arg(short, long, global = true, env = "CHERRY_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the commit feed and open pull requests for new commits
    Watch,
    /// Open a pull request merging the canonical default branch
    Sync {
        /// Ask before merging and pushing
        #[arg(long)]
        confirm: bool,
    },
    /// Clone or reset the working copy and exit
    Setup,
    /// Show the GitHub credential in use
    Auth {
        /// GitHub Enterprise host
        #[arg(long)]
        host: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "cherry_sync=info",
        1 => "cherry_sync=debug",
        _ => "cherry_sync=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Watch => cli::run_watch(config).await?,
        Commands::Sync { confirm } => cli::run_sync(config, cli::SyncOptions { confirm }).await?,
        Commands::Setup => cli::run_setup(config).await?,
        Commands::Auth { host } => cli::run_auth(host.as_deref()).await?,
    }

    Ok(())
}
