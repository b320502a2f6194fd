//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// peercache - Peer build cache node
///
/// Admission-controlled, content-addressed sharing of build outputs
/// between machines, without a central blob server.
#[derive(Parser, Debug)]
#[command(name = "peercache")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PEERCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the configuration file
    Init(InitArgs),

    /// Show store usage and admission state
    Status,

    /// List ledger entries (or recent evictions)
    Ledger(LedgerArgs),

    /// Ingest a local file through the push path
    Add(AddArgs),

    /// Ask whether a push would be admitted
    Check(CheckArgs),

    /// Delete content from this node
    Delete(DeleteArgs),

    /// Evict oldest content until the requested bytes are free
    Gc(GcArgs),

    /// Reconcile the ledger against the bytes on disk
    Verify(VerifyArgs),

    /// Show configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Hash algorithm selector for the add command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoArg {
    Sha256,
    Blake3,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the ledger command
#[derive(Parser, Debug)]
pub struct LedgerArgs {
    /// Show the eviction ghost log instead of held content
    #[arg(long)]
    pub ghosts: bool,
}

/// Arguments for the add command
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// File to ingest
    pub file: PathBuf,

    /// Hash algorithm to name the content with
    #[arg(long, value_enum, default_value = "sha256")]
    pub algo: AlgoArg,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Content hash, e.g. sha256:9f86d0...
    pub hash: String,

    /// The content's rank (age), if known
    #[arg(long)]
    pub rank: Option<u64>,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Content hash to remove
    pub hash: String,

    /// Also notify configured peers (best-effort)
    #[arg(long)]
    pub purge: bool,
}

/// Arguments for the gc command
#[derive(Parser, Debug)]
pub struct GcArgs {
    /// Bytes to free
    #[arg(long)]
    pub free: u64,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Repair findings: drop dangling ledger entries, remove orphan blobs
    #[arg(long)]
    pub fix: bool,
}

/// Config subcommand actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_add_with_algo() {
        let cli = Cli::parse_from(["peercache", "add", "out.tar", "--algo", "blake3"]);
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.file, PathBuf::from("out.tar"));
                assert_eq!(args.algo, AlgoArg::Blake3);
            }
            other => panic!("expected add, got {:?}", other),
        }
    }

    #[test]
    fn parse_check_with_rank() {
        let cli = Cli::parse_from(["peercache", "check", "sha256:abc", "--rank", "12"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.hash, "sha256:abc");
                assert_eq!(args.rank, Some(12));
            }
            other => panic!("expected check, got {:?}", other),
        }
    }

    #[test]
    fn verbose_is_counted() {
        let cli = Cli::parse_from(["peercache", "-vv", "status"]);
        assert_eq!(cli.verbose, 2);
    }
}
