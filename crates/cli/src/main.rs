//! Quarry CLI — the main entry point.
//!
//! Commands:
//! - `run`    — Run the full feature-engineering pipeline
//! - `ask`    — Send one task through the agent loop
//! - `query`  — Execute raw SQL against the warehouse
//! - `status` — Show configuration and connectivity

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quarry",
    about = "Quarry — SQL feature-engineering agent for warehouse data",
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
    /// Run the full pipeline: question, SQL, judge, record, evaluate
    Run {
        /// Override the semantic model file
        #[arg(short, long)]
        model_path: Option<String>,
    },

    /// Send a single task through the agent loop and print the answer
    Ask {
        /// The task text
        task: String,
    },

    /// Execute a raw SQL statement against the warehouse
    Query {
        /// The SQL to run
        sql: String,
    },

    /// Show configuration and warehouse connectivity
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { model_path } => commands::run::run(model_path).await?,
        Commands::Ask { task } => commands::ask::run(task).await?,
        Commands::Query { sql } => commands::query::run(sql).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
