//! Vesta CLI — the main entry point.
//!
//! Commands:
//! - `ask`      — Route one utterance and print the answer
//! - `chat`     — Interactive session on one conversation
//! - `gateway`  — Start the HTTP gateway
//! - `status`   — Show the effective configuration
//! - `config`   — Initialize, show or validate the config file
//! - `memory`   — Conversation memory statistics and cleanup

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "vesta",
    about = "Vesta — hybrid decision engine for a Spanish voice assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.vesta/config.toml)
    #[arg(short, long, global = true, env = "VESTA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a single utterance
    Ask {
        /// What the user said
        text: String,

        /// Conversation session id
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive chat on one session
    Chat {
        #[arg(short, long, default_value = "cli")]
        session: String,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show system status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Conversation memory management
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as TOML
    Show,
    /// Validate the configuration
    Validate,
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Record counts and recent activity
    Stats {
        #[arg(short, long, default_value = "cli")]
        session: String,
    },
    /// Delete records older than the retention period
    Cleanup {
        /// Override memory.retention_days
        #[arg(short, long)]
        days: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask {
            text,
            session,
            json,
        } => commands::ask::run(config_path, &text, &session, json).await?,
        Commands::Chat { session } => commands::ask::chat(config_path, &session).await?,
        Commands::Gateway { port } => commands::gateway::run(config_path, port).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force).await?,
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
        },
        Commands::Memory { action } => match action {
            MemoryAction::Stats { session } => commands::memory::stats(config_path, &session).await?,
            MemoryAction::Cleanup { days } => commands::memory::cleanup(config_path, days).await?,
        },
    }

    Ok(())
}
