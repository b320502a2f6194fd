//! Delete command - remove content from this node

use crate::cli::args::DeleteArgs;
use crate::cli::commands::{format_bytes, open_handler};
use crate::config::Config;
use crate::error::PeerCacheResult;
use crate::hash::ContentHash;
use crate::protocol::{CancelToken, DeleteOptions};
use console::style;

/// Execute the delete command
pub async fn execute(args: DeleteArgs, config: &Config) -> PeerCacheResult<()> {
    let hash: ContentHash = args.hash.parse()?;
    let options = if args.purge {
        DeleteOptions::purge()
    } else {
        DeleteOptions::local_only()
    };

    let handler = open_handler(config).await?;
    let outcome = handler
        .handle_delete(hash, options, &CancelToken::never())
        .await?;

    if outcome.removed_local {
        println!(
            "{} Deleted {} ({} freed)",
            style("✓").green().bold(),
            hash.short(),
            format_bytes(outcome.bytes_freed)
        );
    } else {
        println!("{} Nothing held for {}", style("-").dim(), hash.short());
    }

    for failure in &outcome.peer_failures {
        println!(
            "{} Peer {} not notified: {}",
            style("!").yellow().bold(),
            failure.peer,
            failure.reason
        );
    }

    Ok(())
}
