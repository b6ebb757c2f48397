//! Wayfarer CLI — the main entry point.
//!
//! Commands:
//! - `chat`        — Interactive travel-assistant chat or single-message mode
//! - `preferences` — Show or set stored travel preferences
//! - `doctor`      — Diagnose configuration and API keys

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "wayfarer",
    about = "Wayfarer — a plan-and-execute travel assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the travel assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show or set stored travel preferences
    Preferences {
        /// Replace the stored preferences with this text
        #[arg(long)]
        set: Option<String>,
    },

    /// Diagnose configuration health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Preferences { set } => commands::preferences::run(set).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
