//! Ledger command - list held content or recent evictions

use crate::cli::args::LedgerArgs;
use crate::cli::commands::{format_bytes, open_state};
use crate::config::Config;
use crate::error::PeerCacheResult;
use console::style;

/// Execute the ledger command
pub async fn execute(args: LedgerArgs, config: &Config) -> PeerCacheResult<()> {
    let (_, index, _) = open_state(config).await?;

    if args.ghosts {
        if index.ghosts.is_empty() {
            println!("No recorded evictions");
            return Ok(());
        }

        println!("{}", style(format!("{:<22} {:>8}", "HASH", "RANK")).bold());
        for ghost in index.ghosts.iter() {
            println!("{:<22} {:>8}", ghost.hash.short(), ghost.rank);
        }
        return Ok(());
    }

    if index.ledger.is_empty() {
        println!("No content held");
        return Ok(());
    }

    let mut entries: Vec<_> = index.ledger.entries().collect();
    entries.sort_by(|a, b| b.access_seq.cmp(&a.access_seq));

    println!(
        "{}",
        style(format!(
            "{:<22} {:>10} {:>8} {:>8}  {}",
            "HASH", "SIZE", "INSERT", "ACCESS", "INSERTED AT"
        ))
        .bold()
    );
    for entry in entries {
        println!(
            "{:<22} {:>10} {:>8} {:>8}  {}",
            entry.hash.short(),
            format_bytes(entry.size_bytes),
            entry.insert_seq,
            entry.access_seq,
            entry.inserted_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
