//! Atelier CLI - Command-line interface for the prompt-to-3D pipeline

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate, history, status};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Prompt-to-3D creative pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter (overrides ATELIER_LOG, e.g. "debug" or "atelier_pipeline=trace")
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full generation pipeline for a prompt
    Generate {
        /// The text prompt to generate from
        prompt: String,

        /// Use the offline mock client instead of the remote service
        #[arg(long)]
        mock: bool,

        /// Data directory for artifacts and the journal
        #[arg(long)]
        data_dir: Option<String>,

        /// Path to a config file (bypasses layered loading)
        #[arg(long)]
        config: Option<String>,
    },

    /// Recall previous generations by prompt substring
    History {
        /// Substring to match against original prompts (empty matches all)
        #[arg(default_value = "")]
        substring: String,

        /// Data directory holding the journal
        #[arg(long)]
        data_dir: Option<String>,

        /// Output format (json or table)
        #[arg(long, default_value = "table")]
        format: String,

        /// Re-hash artifact files and flag records whose artifacts changed
        #[arg(long)]
        verify: bool,
    },

    /// Show resolved configuration and collaborator availability
    Status {
        /// Path to a config file (bypasses layered loading)
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = cli
        .log
        .clone()
        .or_else(|| std::env::var("ATELIER_LOG").ok())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            prompt,
            mock,
            data_dir,
            config,
        } => generate::run(&prompt, mock, data_dir, config),
        Commands::History {
            substring,
            data_dir,
            format,
            verify,
        } => history::run(&substring, data_dir, &format, verify),
        Commands::Status { config } => status::run(config),
    }
}
