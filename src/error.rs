//! Error taxonomy for the fetch/extract pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    // Session bootstrap
    #[error("cookie file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error decoding JSON in {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("error parsing domain '{domain}': {source}")]
    DomainParse {
        domain: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid cookie '{name}': {reason}")]
    InvalidCookie { name: String, reason: String },

    // Fetch
    #[error("invalid request for '{url}': {reason}")]
    RequestConstruction { url: String, reason: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("too many redirects fetching {url}")]
    TooManyRedirects { url: String },

    #[error("failed to fetch document: {url} returned {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("failed to parse document from {url}: {reason}")]
    Parse { url: String, reason: String },

    // Access gate
    #[error("adult content detected for mod {mod_id}, cookies not working")]
    AdultContentGated { mod_id: i64 },

    // Browser cookie stores
    #[error("no cookie stores found")]
    NoCookieStoresFound,

    #[error("no matching cookies found")]
    NoMatchingCookies,

    #[error("fetch task failed: {0}")]
    TaskFailed(String),

    #[error("failed to serialize output: {0}")]
    Serialize(String),

    #[error("failed to write {}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
