use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::agent::RunGuard;

#[derive(Parser)]
#[command(name = "curiobot")]
#[command(about = "LLM-routed Q&A over weather, news, and wiki tools", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.curiobot/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service (the default when no command is given).
    Serve {
        /// Listen address, e.g. 127.0.0.1:8080.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Answer a single question and print the result as JSON.
    Ask {
        /// The question to route.
        question: String,
    },
}

/// One-shot mode: run a single question through the pipeline and print the
/// full result record.
pub async fn run_ask(guard: &RunGuard, question: &str) -> Result<()> {
    let result = guard.run(question).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
