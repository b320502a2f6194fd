//! Check command - admission pre-check for a prospective push

use crate::cli::args::CheckArgs;
use crate::cli::commands::open_handler;
use crate::config::Config;
use crate::error::PeerCacheResult;
use crate::hash::ContentHash;
use console::style;

/// Execute the check command
pub async fn execute(args: CheckArgs, config: &Config) -> PeerCacheResult<()> {
    let hash: ContentHash = args.hash.parse()?;
    let handler = open_handler(config).await?;

    let (accepted, reason) = handler.can_accept_content(&hash, args.rank);

    if accepted {
        println!("{} Would accept {}", style("✓").green().bold(), hash.short());
    } else {
        println!(
            "{} Would reject {}: {}",
            style("✗").red().bold(),
            hash.short(),
            reason
        );
    }

    Ok(())
}
