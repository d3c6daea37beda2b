use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ft_cli::commands::{export, report, run, trim};
use ft_cli::{Cli, Commands, Config};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ft_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ft_db::Database::open(&config.database_path, config.merge_gap_seconds)
        .context("failed to open database")?;
    Ok((db, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match cli.command {
        Some(Commands::Run) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            run::run(config, db).await?;
        }
        Some(Commands::Report { day, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let day = day.unwrap_or_else(|| Local::now().date_naive());
            report::run(&db, day, json)?;
        }
        Some(Commands::Export {
            day,
            format,
            output,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let day = day.unwrap_or_else(|| Local::now().date_naive());
            let path = export::run(&db, day, format, output)?;
            println!("wrote {}", path.display());
        }
        Some(Commands::Trim { day, substring }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let day = day.unwrap_or_else(|| Local::now().date_naive());
            trim::run(&mut db, day, &substring)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
