//! Lepestok CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! lepestok-cli migrate
//!
//! # Seed the catalog from a YAML file
//! lepestok-cli seed -f seed/products.yaml
//!
//! # Manage the admin allow-list
//! lepestok-cli admin add 123456789
//! lepestok-cli admin remove 123456789
//! lepestok-cli admin list
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lepestok-cli")]
#[command(author, version, about = "Lepestok CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the product catalog from a YAML file
    Seed {
        /// Path to the YAML seed file
        #[arg(short, long)]
        file: std::path::PathBuf,
    },
    /// Manage the admin allow-list
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Add a Telegram id to the allow-list
    Add {
        /// Telegram user id
        tg_id: String,
    },
    /// Remove a Telegram id from the allow-list
    Remove {
        /// Telegram user id
        tg_id: String,
    },
    /// List allow-list entries
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Admin { action } => match action {
            AdminAction::Add { tg_id } => commands::admin::add(&tg_id).await?,
            AdminAction::Remove { tg_id } => commands::admin::remove(&tg_id).await?,
            AdminAction::List => commands::admin::list().await?,
        },
    }
    Ok(())
}
