//! Two-page fetch pipeline for a single mod
//!
//! The main page and the files tab are fetched in parallel. Each task
//! returns its own [`PageSection`]; the record is only assembled after both
//! have succeeded, so a failure never leaks a half-filled record.

use crate::concurrent::{concurrent_fetch, Task};
use crate::error::{Result, ScrapeError};
use crate::extract::{extract_files, extract_mod_page};
use crate::fetch::DocumentFetcher;
use crate::gate::is_adult_content;
use crate::schema::{FileEntry, ModPage, ModRecord};
use chrono::Utc;
use futures::FutureExt;
use scraper::Html;
use tracing::{info, warn};
use url::Url;

/// Output of one page task
#[derive(Debug)]
pub enum PageSection {
    Main(ModPage),
    Files(Vec<FileEntry>),
}

/// `{base_url}/{game}/mods/{mod_id}`, validated as a URL
pub fn mod_url(base_url: &str, game: &str, mod_id: i64) -> Result<String> {
    let url = format!("{}/{}/mods/{}", base_url.trim_end_matches('/'), game, mod_id);
    Url::parse(&url).map_err(|e| ScrapeError::RequestConstruction {
        url: url.clone(),
        reason: e.to_string(),
    })?;
    Ok(url)
}

pub fn files_tab_url(mod_url: &str) -> String {
    format!("{}?tab=files", mod_url)
}

/// Fetch both pages concurrently and assemble the record.
pub async fn fetch_mod_info_concurrent(
    fetcher: &DocumentFetcher,
    base_url: &str,
    game: &str,
    mod_id: i64,
) -> Result<ModRecord> {
    let url = mod_url(base_url, game, mod_id)?;
    info!(mod_id, game, "scraping mod");

    let main_task: Task<PageSection> = {
        let fetcher = fetcher.clone();
        let url = url.clone();
        async move {
            let doc = fetcher.fetch_document(&url).await?;
            read_main_page(&doc, mod_id).map(PageSection::Main)
        }
        .boxed()
    };

    let files_task: Task<PageSection> = {
        let fetcher = fetcher.clone();
        let files_url = files_tab_url(&url);
        async move {
            let doc = fetcher.fetch_document(&files_url).await?;
            Ok(PageSection::Files(extract_files(&doc)))
        }
        .boxed()
    };

    let mut page = None;
    let mut files = None;
    for section in concurrent_fetch(vec![main_task, files_task]).await? {
        match section {
            PageSection::Main(p) => page = Some(p),
            PageSection::Files(f) => files = Some(f),
        }
    }

    match (page, files) {
        (Some(page), Some(files)) => Ok(ModRecord::assemble(mod_id, url, page, files)),
        _ => Err(ScrapeError::TaskFailed(
            "page task returned no section".to_string(),
        )),
    }
}

/// Same result as [`fetch_mod_info_concurrent`], one page after the other.
///
/// The files tab is not requested when the main page is gated.
pub async fn fetch_mod_info_sequential(
    fetcher: &DocumentFetcher,
    base_url: &str,
    game: &str,
    mod_id: i64,
) -> Result<ModRecord> {
    let url = mod_url(base_url, game, mod_id)?;

    let page = {
        let doc = fetcher.fetch_document(&url).await?;
        read_main_page(&doc, mod_id)?
    };

    let files = {
        let doc = fetcher.fetch_document(&files_tab_url(&url)).await?;
        extract_files(&doc)
    };

    Ok(ModRecord::assemble(mod_id, url, page, files))
}

fn read_main_page(doc: &Html, mod_id: i64) -> Result<ModPage> {
    if is_adult_content(doc, mod_id) {
        warn!(mod_id, "mod page is gated behind the adult content filter");
        return Err(ScrapeError::AdultContentGated { mod_id });
    }

    let mut page = extract_mod_page(doc);
    page.last_checked = Some(Utc::now());
    Ok(page)
}
