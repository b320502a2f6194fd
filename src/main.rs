//! peercache - Peer build cache node
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use peercache::cli::{Cli, Commands};
use peercache::config::ConfigManager;
use peercache::error::PeerCacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PeerCacheResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("peercache=warn"),
        1 => EnvFilter::new("peercache=info"),
        _ => EnvFilter::new("peercache=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Completions and init don't need a loaded config
    match cli.command {
        Commands::Completions(args) => return peercache::cli::commands::completions(args),
        Commands::Init(args) => return peercache::cli::commands::init(args, &manager).await,
        _ => {}
    }

    let config = manager.load().await?;

    match cli.command {
        Commands::Init(_) | Commands::Completions(_) => unreachable!("handled above"),
        Commands::Status => peercache::cli::commands::status(&config).await,
        Commands::Ledger(args) => peercache::cli::commands::ledger(args, &config).await,
        Commands::Add(args) => peercache::cli::commands::add(args, &config).await,
        Commands::Check(args) => peercache::cli::commands::check(args, &config).await,
        Commands::Delete(args) => peercache::cli::commands::delete(args, &config).await,
        Commands::Gc(args) => peercache::cli::commands::gc(args, &config).await,
        Commands::Verify(args) => peercache::cli::commands::verify(args, &config).await,
        Commands::Config(args) => peercache::cli::commands::config(args, &config, &manager).await,
    }
}
