//! scrape command: Scrape a mod page and its files tab

use crate::config::{data_storage_path, DEFAULT_BASE_URL, DEFAULT_COOKIE_FILENAME};
use crate::export::{render_record, save_mod_json, OutputFormat};
use crate::fetch::DocumentFetcher;
use crate::pipeline::fetch_mod_info_concurrent;
use crate::session::Session;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct ScrapeArgs {
    /// Game name as used in mod URLs (e.g. skyrimspecialedition)
    pub game: String,

    /// Numeric mod id
    pub mod_id: i64,

    /// Base url for the mods
    #[arg(short = 'u', long, env = "NEXUS_SCRAPER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Directory your cookie file is stored in (default: data storage path)
    #[arg(short = 'd', long, env = "NEXUS_SCRAPER_COOKIE_DIR")]
    pub cookie_directory: Option<PathBuf>,

    /// Filename where the cookies are stored
    #[arg(short = 'f', long, default_value = DEFAULT_COOKIE_FILENAME)]
    pub cookie_filename: String,

    /// Display the results in the terminal
    #[arg(short = 'r', long)]
    pub display_results: bool,

    /// Save the results to a JSON file
    #[arg(short = 's', long)]
    pub save_results: bool,

    /// Output directory to save files (default: data storage path)
    #[arg(short = 'o', long, env = "NEXUS_SCRAPER_OUTPUT_DIR")]
    pub output_directory: Option<PathBuf>,

    /// Format for displayed results
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Run the scrape command
pub async fn run_scrape(args: ScrapeArgs) -> Result<()> {
    if !args.display_results && !args.save_results {
        bail!("at least one of --display-results (-r) or --save-results (-s) must be enabled");
    }

    let cookie_dir = match args.cookie_directory {
        Some(dir) => dir,
        None => data_storage_path().context("Could not determine the data storage directory")?,
    };

    eprintln!("Setting up session...");
    let session = Session::bootstrap(&args.base_url, &cookie_dir, &args.cookie_filename)
        .await
        .with_context(|| {
            format!(
                "Error setting up session, run `extract` to create {}",
                cookie_dir.join(&args.cookie_filename).display()
            )
        })?;
    let fetcher = DocumentFetcher::new(Arc::new(session));

    eprintln!("Scraping mod {} for game {}...", args.mod_id, args.game);
    let record = fetch_mod_info_concurrent(&fetcher, &args.base_url, &args.game, args.mod_id)
        .await
        .context("Error scraping mod")?;

    if args.display_results {
        println!("{}", render_record(&record, args.format)?);
    }

    if args.save_results {
        let output_dir = match args.output_directory {
            Some(dir) => dir,
            None => data_storage_path().context("Could not determine the data storage directory")?,
        };

        let path = save_mod_json(&output_dir.join(args.game.to_lowercase()), &record)
            .await
            .context("Error saving results")?;
        eprintln!("Saved successfully to {}", path.display());
    } else {
        eprintln!("Scraping complete");
    }

    Ok(())
}
