//! Digital Garden CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! garden-cli migrate
//!
//! # Create an account (user, profile, store and purchase ledger)
//! garden-cli account create -u alice -p 'correct horse'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `account create` - Provision an account, same rules as `POST /api/register`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "garden-cli")]
#[command(author, version, about = "Digital Garden CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        /// Username (stored lowercase)
        #[arg(short, long)]
        username: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,
    },
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
        Commands::Account { action } => match action {
            AccountAction::Create { username, password } => {
                commands::account::create(&username, &password).await?;
            }
        },
    }
    Ok(())
}
