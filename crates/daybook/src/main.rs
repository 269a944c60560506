//! # Daybook CLI (`daybook`)
//!
//! ## Usage
//!
//! ```bash
//! daybook --config ./config/daybook.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `daybook init` | Create the SQLite database and run schema migrations |
//! | `daybook serve` | Start the journal HTTP server |
//! | `daybook add` | Create an entry from the command line |
//! | `daybook list` | List all entries |
//! | `daybook get <id>` | Show one entry |
//! | `daybook recap` | Run the daily recap job |
//!
//! Log verbosity is controlled with `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use daybook::{config, entries, migrate, recap, server};

/// Daybook, a personal journaling backend with a daily recap job.
#[derive(Parser)]
#[command(name = "daybook", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/daybook.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Start the journal HTTP server.
    ///
    /// Binds to `[server].bind` and runs until Ctrl+C or SIGTERM.
    Serve,

    /// Create a journal entry.
    Add {
        /// Entry text.
        #[arg(long)]
        text: Option<String>,

        /// Latitude in decimal degrees.
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,

        /// Longitude in decimal degrees.
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<String>,

        /// Media file to attach. Repeat for several files; order is kept.
        #[arg(long)]
        media: Vec<PathBuf>,
    },

    /// List all journal entries in store order.
    List {
        /// Print entries as JSON, in the same shape as `GET /entries`.
        #[arg(long)]
        json: bool,
    },

    /// Show a single entry by id.
    Get {
        /// Entry UUID.
        id: String,
    },

    /// Run the daily recap over the last day's entries.
    Recap {
        /// Select and plan only; call no collaborators and record nothing.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Add {
            text,
            lat,
            lon,
            media,
        } => {
            entries::run_add(&cfg, text, lat, lon, &media).await?;
        }
        Commands::List { json } => {
            entries::run_list(&cfg, json).await?;
        }
        Commands::Get { id } => {
            entries::run_get(&cfg, &id).await?;
        }
        Commands::Recap { dry_run } => {
            let report = recap::run_recap(&cfg, dry_run).await?;
            recap::print_report(&report);
        }
    }

    Ok(())
}
