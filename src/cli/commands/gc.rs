//! Gc command - evict oldest content to free space

use crate::cli::args::GcArgs;
use crate::cli::commands::{format_bytes, open_state};
use crate::config::Config;
use crate::error::PeerCacheResult;
use crate::store::ByteStore;
use console::style;

/// Execute the gc command
///
/// Evictions performed here are real evictions: each one is recorded in
/// the ghost log and will influence future admission decisions.
pub async fn execute(args: GcArgs, config: &Config) -> PeerCacheResult<()> {
    let (store, mut index, index_path) = open_state(config).await?;

    let evicted = index
        .ledger
        .evict_oldest(args.free, store.capacity_bytes(), |_| false);
    for entry in &evicted {
        index.ghosts.record_eviction(entry.hash, entry.access_seq);
    }
    index.save(&index_path).await?;

    let mut freed = 0;
    for entry in &evicted {
        store.remove(&entry.hash).await?;
        freed += entry.size_bytes;
        println!(
            "{} Evicted {} ({}, rank {})",
            style("-").dim(),
            entry.hash.short(),
            format_bytes(entry.size_bytes),
            entry.access_seq
        );
    }

    if evicted.is_empty() {
        println!("Nothing to evict, requested space already free");
    } else {
        println!(
            "{} Freed {} across {} entries",
            style("✓").green().bold(),
            format_bytes(freed),
            evicted.len()
        );
    }

    Ok(())
}
