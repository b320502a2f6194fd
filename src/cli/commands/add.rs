//! Add command - ingest a local file through the push path

use crate::cli::args::{AddArgs, AlgoArg};
use crate::cli::commands::{format_bytes, open_handler};
use crate::config::Config;
use crate::error::{PeerCacheError, PeerCacheResult};
use crate::hash::{ContentHash, HashAlgorithm};
use crate::protocol::{CancelToken, PushOutcome};
use console::style;
use tokio::fs;

/// Execute the add command
///
/// Runs the real push path, admission included, so a locally added file
/// behaves exactly like one a peer pushed.
pub async fn execute(args: AddArgs, config: &Config) -> PeerCacheResult<()> {
    let data = fs::read(&args.file)
        .await
        .map_err(|e| PeerCacheError::SourceUnreadable {
            path: args.file.clone(),
            source: e,
        })?;

    let algo = match args.algo {
        AlgoArg::Sha256 => HashAlgorithm::Sha256,
        AlgoArg::Blake3 => HashAlgorithm::Blake3,
    };
    let hash = ContentHash::digest_of(algo, &data);

    let handler = open_handler(config).await?;
    let outcome = handler
        .handle_push_file(hash, &args.file, None, &CancelToken::never())
        .await?;

    match outcome {
        PushOutcome::Committed { bytes_written } => {
            println!(
                "{} Added {} ({})",
                style("✓").green().bold(),
                hash,
                format_bytes(bytes_written)
            );
        }
        PushOutcome::Rejected { reason } => {
            println!(
                "{} Not added: {} ({})",
                style("!").yellow().bold(),
                reason,
                hash.short()
            );
        }
    }

    Ok(())
}
