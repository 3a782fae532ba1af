//! nexus-mods-scraper: Scrape Nexus Mods mod pages into structured records
//!
//! Pipeline:
//! - session: replay captured browser cookies
//! - fetch: cookie-authenticated GETs parsed into HTML trees
//! - gate: detect pages withheld behind the adult content filter
//! - extract: selector-driven field extraction
//! - concurrent / pipeline: fetch the mod page and files tab in parallel

pub mod concurrent;
pub mod config;
pub mod cookies;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod gate;
pub mod pipeline;
pub mod schema;
pub mod scrape;
pub mod session;

pub use error::{Result, ScrapeError};
pub use fetch::DocumentFetcher;
pub use pipeline::{fetch_mod_info_concurrent, fetch_mod_info_sequential};
pub use schema::{ChangeLog, FileEntry, ModRecord, ModResults, Requirement};
pub use session::{Session, SessionCookies};
