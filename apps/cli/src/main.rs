//! AI tool tracker CLI.
//!
//! Scans GitHub, Hugging Face and Product Hunt for trending AI tools,
//! enriches them and keeps a local catalog that can be queried offline.

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
