//! Blankforge CLI — brand-focused training-data pipeline.
//!
//! Turns an authored content store (website pages, product catalog,
//! forum threads) into fine-tuning datasets in the common JSONL formats,
//! with validation and an optional hand-off to an external trainer.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
