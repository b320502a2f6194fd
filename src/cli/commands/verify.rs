//! Verify command - reconcile the ledger against bytes on disk
//!
//! The handlers surface `InconsistentState` but never repair it; this is
//! the explicit reconciliation pass. Findings: ledger entries whose bytes
//! are missing (dangling) and committed blobs the ledger does not know
//! about (orphans).

use std::path::Path;

use crate::cli::args::VerifyArgs;
use crate::cli::commands::{format_bytes, open_state};
use crate::config::{Config, ConfigManager};
use crate::error::PeerCacheResult;
use crate::hash::ContentHash;
use crate::store::ByteStore;
use console::style;

/// Execute the verify command
pub async fn execute(args: VerifyArgs, config: &Config) -> PeerCacheResult<()> {
    let (store, mut index, index_path) = open_state(config).await?;
    let root = ConfigManager::store_root(config);

    // Ledger entries whose bytes are gone.
    let mut dangling = Vec::new();
    for entry in index.ledger.entries() {
        if !store.contains(&entry.hash).await {
            dangling.push(entry.hash);
        }
    }

    // Committed blobs the ledger does not know about.
    let mut orphans = Vec::new();
    collect_blob_hashes(&root.join("blobs"), &mut orphans)?;
    orphans.retain(|hash| !index.ledger.contains(hash));

    if dangling.is_empty() && orphans.is_empty() {
        println!(
            "{} Ledger and store agree ({} entries, {})",
            style("✓").green().bold(),
            index.ledger.len(),
            format_bytes(index.ledger.used_bytes())
        );
        return Ok(());
    }

    for hash in &dangling {
        println!(
            "{} Ledger entry without bytes: {}",
            style("✗").red().bold(),
            hash
        );
    }
    for hash in &orphans {
        println!(
            "{} Blob without ledger entry: {}",
            style("!").yellow().bold(),
            hash
        );
    }

    if !args.fix {
        println!();
        println!("Run with --fix to drop dangling entries and remove orphan blobs");
        return Ok(());
    }

    // Dangling entries leave the ledger without ghost records: this is
    // reconciliation, not eviction.
    for hash in &dangling {
        index.ledger.remove(hash);
    }
    index.save(&index_path).await?;
    for hash in &orphans {
        store.remove(hash).await?;
    }

    println!(
        "{} Repaired: {} dangling entries dropped, {} orphan blobs removed",
        style("✓").green().bold(),
        dangling.len(),
        orphans.len()
    );
    Ok(())
}

/// Walk `blobs/<algo>/<xx>/<hex>` collecting every committed hash
fn collect_blob_hashes(blobs: &Path, out: &mut Vec<ContentHash>) -> PeerCacheResult<()> {
    if !blobs.exists() {
        return Ok(());
    }

    for algo_entry in read_dir(blobs)? {
        let algo_name = algo_entry.file_name().to_string_lossy().into_owned();
        for shard_entry in read_dir(&algo_entry.path())? {
            for blob_entry in read_dir(&shard_entry.path())? {
                let hex = blob_entry.file_name().to_string_lossy().into_owned();
                if let Ok(hash) = format!("{}:{}", algo_name, hex).parse() {
                    out.push(hash);
                }
            }
        }
    }
    Ok(())
}

fn read_dir(dir: &Path) -> PeerCacheResult<Vec<std::fs::DirEntry>> {
    std::fs::read_dir(dir)
        .map_err(|e| crate::error::PeerCacheError::io(format!("reading {}", dir.display()), e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| crate::error::PeerCacheError::io(format!("reading {}", dir.display()), e))
}
