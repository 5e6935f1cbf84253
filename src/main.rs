mod cli;
mod ops;

use anyhow::Result;
use clap::Parser;
use fixshot::config::Settings;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Load { aliases } => {
            ops::do_load(&prepare(&cli)?, aliases)?;
        }
        Commands::Key { aliases } => {
            ops::do_key(&prepare(&cli)?, aliases)?;
        }
        Commands::List => {
            ops::do_list(&prepare(&cli)?)?;
        }
        Commands::Clear { yes } => {
            ops::do_clear(&prepare(&cli)?, *yes)?;
        }
        Commands::Version => {
            ops::do_version();
        }
    }

    Ok(())
}

/// Load the configuration file and install the log subscriber it asks for.
fn prepare(cli: &Cli) -> Result<Settings> {
    let settings = ops::load_settings(&cli.config)?;
    let level = match cli.verbose {
        0 => settings.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
    Ok(settings)
}
