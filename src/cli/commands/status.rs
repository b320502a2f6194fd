//! Status command - show store usage and admission state

use crate::cli::commands::{format_bytes, open_state};
use crate::config::{Config, ConfigManager};
use crate::error::PeerCacheResult;
use crate::store::ByteStore;
use console::style;

/// Execute the status command
pub async fn execute(config: &Config) -> PeerCacheResult<()> {
    let (store, index, _) = open_state(config).await?;
    let root = ConfigManager::store_root(config);

    println!("{}", style("peercache Node Status").bold().cyan());
    println!();

    println!("{}", style("Store:").bold());
    println!("  Root:      {}", root.display());
    println!(
        "  Usage:     {} of {} ({} entries)",
        format_bytes(index.ledger.used_bytes()),
        format_bytes(store.capacity_bytes()),
        index.ledger.len()
    );
    if store.used_bytes() != index.ledger.used_bytes() {
        println!(
            "  {} On-disk bytes ({}) differ from ledger accounting; run: peercache verify",
            style("!").yellow().bold(),
            format_bytes(store.used_bytes())
        );
    }

    println!();
    println!("{}", style("Admission:").bold());
    println!(
        "  Pushes:    {}",
        if config.admission.push_enabled {
            style("enabled").green()
        } else {
            style("disabled").yellow()
        }
    );
    match index.ghosts.last_eviction_rank() {
        Some(rank) => println!(
            "  Baseline:  rank {} ({} recent evictions remembered)",
            rank,
            index.ghosts.len()
        ),
        None => println!("  Baseline:  none (no evictions recorded)"),
    }

    println!();
    println!("{}", style("Peers:").bold());
    let peers = config.peers.parse()?;
    if peers.is_empty() {
        println!("  none configured");
    } else {
        for peer in peers {
            println!("  {}", peer);
        }
    }

    Ok(())
}
