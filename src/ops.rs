use anyhow::{Result, anyhow};
use colored::*;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

use fixshot::DatabaseHelper;
use fixshot::config::Settings;
use fixshot::drivers::process::{CommandRunner, SystemRunner};
use fixshot::fixtures::resolve_aliases;
use fixshot::manager::{EngineManagerFactory, ManagerFactory};
use fixshot::shell::{ShellFixtureLoader, ShellSession};
use fixshot::storage;

pub fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load(path).map_err(|e| anyhow!("failed to load {}: {}", path.display(), e))
}

pub fn do_load(settings: &Settings, aliases: &[String]) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let factory = EngineManagerFactory::new(runner.clone(), &settings.cache_dir);
    let session = ShellSession::new(runner.clone(), settings.connection_params()?, settings.purge_command.clone());
    let loader = ShellFixtureLoader::new(runner, settings.load_fixtures_command.clone());
    let mut helper = DatabaseHelper::new(
        factory,
        session,
        loader,
        settings.fixture_paths.clone(),
        settings.manager_options(),
    );

    let bar = create_progress_bar("Preparing database");
    let result = helper.load_fixtures(aliases);
    bar.finish_and_clear();
    result?;

    let what = if aliases.is_empty() {
        "baseline schema".to_string()
    } else {
        aliases.join(", ")
    };
    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Loaded {} on connection '{}'", what, helper.connection_name()).green()
    );
    Ok(())
}

pub fn do_key(settings: &Settings, aliases: &[String]) -> Result<()> {
    let fixtures = resolve_aliases(&settings.fixture_paths, aliases)?;
    let factory = EngineManagerFactory::new(Arc::new(SystemRunner), &settings.cache_dir);
    let manager = factory.create_database_manager(&settings.connection_params()?, &settings.manager_options())?;

    for path in fixtures.paths() {
        println!("  {}", path.display());
    }
    let artifact = manager.backup_path(&fixtures);
    let cached = if manager.backup_exists(&fixtures) {
        "cached".green()
    } else {
        "not cached".yellow()
    };
    println!("{} {}", "key".bold(), fixtures.key().to_string().cyan());
    println!("{} {} ({})", "snapshot".bold(), artifact.display(), cached);
    Ok(())
}

pub fn do_list(settings: &Settings) -> Result<()> {
    let snapshots = storage::list_snapshots(&settings.cache_dir)?;

    if snapshots.is_empty() {
        println!("{} {}", "i".yellow().bold(), "No snapshots found".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Database").add_attribute(Attribute::Bold),
            Cell::new("Key").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Modified").add_attribute(Attribute::Bold),
        ]);

    for s in &snapshots {
        table.add_row(vec![
            Cell::new(&s.database),
            Cell::new(&s.key[..12]),
            Cell::new(human_size(s.size)),
            Cell::new(s.modified.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn do_clear(settings: &Settings, yes: bool) -> Result<()> {
    let dir = &settings.cache_dir;
    if !yes && !prompt_confirm(&format!("Delete every snapshot in {}? [y/N] ", dir.display()))? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = storage::clear_cache(dir)?;
    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Removed {} cached snapshot(s)", removed).green()
    );
    Ok(())
}

pub fn do_version() {
    println!("{} {}", "fixshot".bold(), env!("CARGO_PKG_VERSION").cyan());
}

fn create_progress_bar(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );
    bar.set_message(prefix.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}

fn prompt_confirm(message: &str) -> Result<bool> {
    use std::io::{self, Write};
    print!("{} {}", "?".cyan().bold(), message.cyan());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let ans = input.trim().to_lowercase();
    Ok(ans == "y" || ans == "yes")
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
