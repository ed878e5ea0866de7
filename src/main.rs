//! Songlib CLI - song library service over SQLite

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use songlib::storage::SqliteStore;
use songlib::{config, server};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "songlib")]
#[command(version = "0.1.0")]
#[command(about = "Song library service - songs, numbered verses, and metadata enrichment")]
#[command(long_about = r#"
Songlib stores songs and their lyrics split into numbered verses, enriching
newly added songs through an external metadata lookup.

Example usage:
  songlib init
  songlib serve --port 3000 --external-api http://localhost:9000
  songlib stats --database songlib.db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Path to the config file (defaults to songlib.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Base URL of the external metadata API
        #[arg(short, long)]
        external_api: Option<String>,
    },

    /// Show statistics about the stored library
    Stats {
        /// Path to the config file (defaults to songlib.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a default songlib.toml config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve {
            config,
            port,
            database,
            external_api,
        } => {
            let file = config::load_config(config.as_deref())?.unwrap_or_default();
            let database = database
                .or_else(|| file.database.as_deref().map(PathBuf::from))
                .unwrap_or_else(config::default_database_path);
            let port = port.or(file.port).unwrap_or(3000);
            let external_api = external_api.or(file.external_api).ok_or_else(|| {
                anyhow::anyhow!("external_api must be set via --external-api or songlib.toml")
            })?;

            config::ensure_db_dir(&database)?;
            // Migrations run here; a failure aborts before the server binds.
            let store = SqliteStore::open(&database)?;
            tracing::info!(database = %database.display(), "store ready");

            tokio::runtime::Runtime::new()?
                .block_on(server::start_server(port, store, external_api))
        }

        Commands::Stats { config, database } => {
            let file = config::load_config(config.as_deref())?.unwrap_or_default();
            let database = database
                .or_else(|| file.database.as_deref().map(PathBuf::from))
                .unwrap_or_else(config::default_database_path);

            let store = SqliteStore::open(&database)?;
            let stats = store.stats()?;
            println!("{stats}");
            Ok(())
        }

        Commands::Init { force } => {
            let path = config::default_config_path();
            let config = config::SonglibConfig {
                database: Some(config::default_database_path().display().to_string()),
                port: Some(3000),
                external_api: Some("http://localhost:9000".to_string()),
            };
            config::write_config(&path, &config, force)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}
