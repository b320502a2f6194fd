//! Init command - write the default configuration file

use crate::cli::args::InitArgs;
use crate::config::{Config, ConfigManager};
use crate::error::PeerCacheResult;
use console::style;

/// Execute the init command
pub async fn execute(args: InitArgs, manager: &ConfigManager) -> PeerCacheResult<()> {
    let path = manager.path();

    if path.exists() && !args.force {
        println!(
            "{} Config already exists at {}",
            style("!").yellow().bold(),
            path.display()
        );
        println!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    println!(
        "{} Configuration initialized at {}",
        style("✓").green().bold(),
        path.display()
    );
    Ok(())
}
