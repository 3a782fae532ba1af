//! nexus-scraper CLI
//!
//! Scrapes Nexus Mods mod pages into JSON, replaying browser session cookies.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nexus_mods_scraper::cookies::{run_extract, ExtractArgs};
use nexus_mods_scraper::scrape::{run_scrape, ScrapeArgs};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nexus-scraper")]
#[command(version)]
#[command(about = "A CLI tool to scrape https://nexusmods.com mods and return the information in JSON format")]
#[command(long_about = "Scrapes a mod page and its files tab using your browser session cookies.\n\nCommands:\n  scrape    Scrape a mod and display or save it as JSON\n  extract   Extract session cookies from exported browser cookie files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a mod for a game and return JSON output
    Scrape(ScrapeArgs),
    /// Extract session cookies and save them to a JSON file
    Extract(ExtractArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!("nexus-scraper {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Scrape(args) => run_scrape(args).await,
        Commands::Extract(args) => run_extract(args).await,
    }
}
