//! Succulent Shop CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shop-cli migrate
//!
//! # Create an account with a generated password
//! shop-cli user create -e admin@example.com -f Ana -l Kovac -r admin
//!
//! # Remove uploaded photos no record references
//! shop-cli cleanup-files
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Succulent Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Delete uploaded photos that no product, plant or blog references
    CleanupFiles,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user with a random password
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        firstname: String,

        #[arg(short, long)]
        lastname: String,

        /// Role (`user`, `employee`, `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Postal address
        #[arg(short, long, default_value = "-")]
        address: String,
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                firstname,
                lastname,
                role,
                address,
            } => {
                commands::user::create(&commands::user::NewAccount {
                    email,
                    firstname,
                    lastname,
                    role,
                    address,
                })
                .await?;
            }
        },
        Commands::CleanupFiles => commands::cleanup::run().await?,
    }
    Ok(())
}
