use clap::{Parser, Subcommand};
use pathfinder_core::{AdventureLibrary, CatalogSearch, SyncEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;

use commands::{
    AdventureCommand, BadgeCommand, ConfigCommand, FlightCommand, PlaceCommand, StopCommand,
};
use config::Config;
use db::{init_db, SqliteStore};

#[derive(Parser)]
#[command(name = "pathfinder")]
#[command(version)]
#[command(about = "Plan multi-stop adventures", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage adventures
    Adventure(AdventureCommand),

    /// Edit the stops of an adventure
    Stop(StopCommand),

    /// Manage the flights of an adventure
    Flight(FlightCommand),

    /// Manage the badges of an adventure
    Badge(BadgeCommand),

    /// Look up places to visit
    Place(PlaceCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    // Logs go to stderr so command output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.value.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Adventure(cmd)) => {
            let mut library = open_library(&config).await?;
            cmd.run(&mut library).await?;
        }
        Some(Commands::Stop(cmd)) => {
            let mut library = open_library(&config).await?;
            cmd.run(&mut library, &CatalogSearch::new()).await?;
        }
        Some(Commands::Flight(cmd)) => {
            let mut library = open_library(&config).await?;
            cmd.run(&mut library).await?;
        }
        Some(Commands::Badge(cmd)) => {
            let mut library = open_library(&config).await?;
            cmd.run(&mut library).await?;
        }
        Some(Commands::Place(cmd)) => {
            cmd.run(&CatalogSearch::new()).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, cli_config_path)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Opens the database and loads every adventure into a library.
async fn open_library(config: &Config) -> Result<AdventureLibrary, Box<dyn std::error::Error>> {
    let pool = init_db(&config.database_path.value).await?;
    let engine = SyncEngine::new(Arc::new(SqliteStore::new(pool)))
        .with_strategy(config.sync.replace_strategy)
        .with_user_id(config.user_id.value.clone());

    let mut library = AdventureLibrary::new(engine);
    library.load().await?;
    Ok(library)
}
