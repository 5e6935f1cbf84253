use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fixshot::config::DEFAULT_CONFIG_FILE;

/// fixshot: cached database snapshots for fixture-driven test suites
#[derive(Parser, Debug)]
#[command(name = "fixshot", version, about = "Restore database snapshots keyed by the fixtures loaded into them.", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring the database to the state of the given fixtures, restoring a cached snapshot when possible
    Load {
        /// Fixture aliases, resolved to `<fixture_path>/<alias>.yml`
        aliases: Vec<String>,
    },

    /// Print the resolved fixture files and their snapshot key
    Key {
        /// Fixture aliases
        aliases: Vec<String>,
    },

    /// List cached snapshots
    List,

    /// Delete every cached snapshot
    Clear {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Print CLI version
    Version,
}
