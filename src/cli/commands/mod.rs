//! CLI command implementations

pub mod add;
pub mod check;
pub mod completions;
pub mod config;
pub mod delete;
pub mod gc;
pub mod init;
pub mod ledger;
pub mod status;
pub mod verify;

pub use add::execute as add;
pub use check::execute as check;
pub use completions::execute as completions;
pub use config::execute as config;
pub use delete::execute as delete;
pub use gc::execute as gc;
pub use init::execute as init;
pub use ledger::execute as ledger;
pub use status::execute as status;
pub use verify::execute as verify;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigManager};
use crate::error::PeerCacheResult;
use crate::journal::Journal;
use crate::ledger::CacheIndex;
use crate::peers::{LoggingNotifier, UnavailableFetcher};
use crate::protocol::{HandlerSettings, TransferHandler};
use crate::store::FsByteStore;

/// Open the node state described by `config` and wire up a handler.
///
/// The CLI has no transfer backend, so copy requests are served by the
/// unavailable fetcher and purge notifications by the logging notifier.
pub(crate) async fn open_handler(config: &Config) -> PeerCacheResult<TransferHandler> {
    let root = ConfigManager::store_root(config);
    let store = Arc::new(FsByteStore::open(&root, config.store.capacity_bytes).await?);
    let staging_dir = store.staging_dir();

    let index_path = ConfigManager::index_path(&root);
    let index =
        CacheIndex::load_or_default(&index_path, config.admission.ghost_log_capacity).await?;
    let journal = Journal::new(config.general.journal, ConfigManager::journal_path(&root));

    Ok(TransferHandler::new(
        store,
        Arc::new(UnavailableFetcher),
        Arc::new(LoggingNotifier),
        index,
        index_path,
        journal,
        HandlerSettings {
            push_enabled: config.admission.push_enabled,
            peers: config.peers.parse()?,
            staging_dir,
        },
    ))
}

/// Open just the store and index, for inspection and maintenance commands
pub(crate) async fn open_state(
    config: &Config,
) -> PeerCacheResult<(FsByteStore, CacheIndex, PathBuf)> {
    let root = ConfigManager::store_root(config);
    let store = FsByteStore::open(&root, config.store.capacity_bytes).await?;
    let index_path = ConfigManager::index_path(&root);
    let index =
        CacheIndex::load_or_default(&index_path, config.admission.ghost_log_capacity).await?;
    Ok((store, index, index_path))
}

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
