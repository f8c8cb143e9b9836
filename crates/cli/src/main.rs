//! Footprint CLI
//!
//! Main entry point for the footprint command-line tool.
//! Imports a personal footprint, indexes it, and answers questions about it
//! with cited sources.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ImportCommand, IndexCommand, PlanCommand, StatsCommand};
use footprint_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Footprint - question answering over your public footprint
#[derive(Parser, Debug)]
#[command(name = "footprint")]
#[command(about = "Question answering over your public footprint", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "FOOTPRINT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "FOOTPRINT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider
    #[arg(short, long, global = true, env = "FOOTPRINT_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "FOOTPRINT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import documents from a JSON Lines file into the content store
    Import(ImportCommand),

    /// Embed new and changed documents into the vector store
    Index(IndexCommand),

    /// Ask a question and get a cited answer
    Ask(AskCommand),

    /// Show how a question would be routed, without retrieving
    Plan(PlanCommand),

    /// Show content and index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse flags first; logging setup depends on them
    let cli = Cli::parse();

    // Defaults, config file and env vars, then CLI flags on top
    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Logging goes to stderr; stdout carries answers
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Footprint CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Ensure .footprint/ exists before any store is opened
    config.ensure_state_dir()?;

    // Every command runs inside a `command` span
    let command_name = match &cli.command {
        Commands::Import(_) => "import",
        Commands::Index(_) => "index",
        Commands::Ask(_) => "ask",
        Commands::Plan(_) => "plan",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Import(cmd) => cmd.execute(&config),
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Plan(cmd) => cmd.execute(&config),
        Commands::Stats(cmd) => cmd.execute(&config),
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
