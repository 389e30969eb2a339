mod commands;
mod config;

use clap::{Parser, Subcommand};
use matchbook_core::{MatchbookEngine, MatchbookError};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "matchbook")]
#[command(about = "Matchbook - pari-mutuel betting markets on two-competitor matches")]
#[command(version)]
struct Cli {
    /// Data directory for the market database
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Market operator commands
    #[command(subcommand)]
    Market(commands::MarketCommands),

    /// Bet placement and inspection
    #[command(subcommand)]
    Bet(commands::BetCommands),

    /// Account and balance commands
    #[command(subcommand)]
    Account(commands::AccountCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "matchbook={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("matchbook")
    });

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;
    tracing::debug!("Using data directory {:?}", data_dir);

    // Initialize the engine
    let engine_config = config::load_engine_config(&data_dir)?;
    let engine = MatchbookEngine::new(&data_dir, engine_config).await?;

    // Execute command
    let result = match cli.command {
        Commands::Market(cmd) => commands::handle_market_command(cmd, &engine).await,
        Commands::Bet(cmd) => commands::handle_bet_command(cmd, &engine).await,
        Commands::Account(cmd) => commands::handle_account_command(cmd, &engine).await,
    };

    if let Err(e) = result {
        match e {
            MatchbookError::AccountNotFound { name } => {
                eprintln!("Error: Account '{}' not found", name);
                eprintln!("Use 'matchbook account list' to see available accounts");
            }
            MatchbookError::InsufficientBalance { need, available } => {
                eprintln!("Error: Insufficient balance");
                eprintln!("Need: {}, Available: {}", need, available);
            }
            MatchbookError::MarketClosed { status } => {
                eprintln!("Error: Market is not open for betting (match is {})", status);
            }
            MatchbookError::UnknownMatch { id } => {
                eprintln!("Error: No match with ID {}", id);
                eprintln!("Use 'matchbook market list' to see available matches");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
