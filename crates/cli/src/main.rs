//! Gena CLI: the main entry point.
//!
//! Commands:
//! - `ask`: Ask one question and print the answer
//! - `chat`: Interactive conversation on one thread
//! - `config`: Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "gena",
    about = "Gena: a tool-calling LLM agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keep the conversation in this JSONL file
    #[arg(long, global = true, value_name = "PATH")]
    thread: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,
    },

    /// Chat with the agent interactively
    Chat,

    /// Print the effective configuration
    Config {
        /// Print a default config file instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask { question } => commands::ask::run(question, cli.thread).await?,
        Commands::Chat => commands::chat::run(cli.thread).await?,
        Commands::Config { default } => commands::config_cmd::run(default)?,
    }

    Ok(())
}
