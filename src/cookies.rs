//! extract command: Collect session cookies from browser cookie stores
//!
//! Browser integration sits behind [`CookieStoreDiscovery`] / [`CookieSource`].
//! The crate ships one implementation that reads Netscape `cookies.txt`
//! exports found by a glob pattern.

use crate::config::{
    data_storage_path, DEFAULT_BASE_URL, DEFAULT_COOKIE_EXPORT_GLOB, DEFAULT_COOKIE_FILENAME,
    DEFAULT_VALID_COOKIES,
};
use crate::error::{Result, ScrapeError};
use crate::export::save_cookies_json;
use crate::session::SessionCookies;
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Args)]
pub struct ExtractArgs {
    /// Site the cookies belong to
    #[arg(short = 'u', long, env = "NEXUS_SCRAPER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output directory to save the file in (default: data storage path)
    #[arg(short = 'd', long, env = "NEXUS_SCRAPER_OUTPUT_DIR")]
    pub output_directory: Option<PathBuf>,

    /// Filename to save the session cookies to
    #[arg(short = 'f', long, default_value = DEFAULT_COOKIE_FILENAME)]
    pub output_filename: String,

    /// Names of the cookies to extract
    #[arg(short = 'c', long, value_delimiter = ',', default_values = DEFAULT_VALID_COOKIES)]
    pub valid_cookie_names: Vec<String>,

    /// Glob matching exported cookies.txt files (default: <data dir>/*cookies*.txt)
    #[arg(long, env = "NEXUS_SCRAPER_COOKIE_FILES")]
    pub cookie_files: Option<String>,
}

/// A cookie as read from a browser store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    /// `None` for session cookies
    pub expires: Option<DateTime<Utc>>,
}

/// Selects unexpired cookies whose domain contains a substring
#[derive(Debug, Clone)]
pub struct CookieFilter {
    pub domain_contains: String,
    pub now: DateTime<Utc>,
}

impl CookieFilter {
    pub fn new(domain: &str) -> Self {
        Self {
            domain_contains: domain.to_string(),
            now: Utc::now(),
        }
    }

    pub fn matches(&self, cookie: &BrowserCookie) -> bool {
        let valid = cookie.expires.map_or(true, |exp| exp > self.now);
        valid && cookie.domain.contains(&self.domain_contains)
    }
}

/// One browser profile's cookie storage
pub trait CookieSource: Send {
    /// Label for log messages
    fn name(&self) -> String;

    fn read_cookies(&mut self, filter: &CookieFilter) -> Result<Vec<BrowserCookie>>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Finds the cookie stores available on this machine
pub trait CookieStoreDiscovery {
    fn discover(&self) -> Vec<Box<dyn CookieSource>>;
}

/// Read the `valid_names` cookies for `domain` from every discovered store.
///
/// Unreadable stores are skipped. When several stores hold the same cookie,
/// the last store read wins.
pub fn extract_cookies(
    discovery: &dyn CookieStoreDiscovery,
    domain: &str,
    valid_names: &[String],
) -> Result<SessionCookies> {
    let stores = discovery.discover();
    if stores.is_empty() {
        return Err(ScrapeError::NoCookieStoresFound);
    }

    let filter = CookieFilter::new(domain);
    let mut cookies = SessionCookies::new();

    for mut store in stores {
        match store.read_cookies(&filter) {
            Ok(found) => {
                debug!(store = %store.name(), count = found.len(), "read cookie store");
                for cookie in found {
                    if valid_names.contains(&cookie.name) {
                        cookies.insert(cookie.name, cookie.value);
                    }
                }
            }
            Err(e) => warn!(store = %store.name(), error = %e, "skipping unreadable cookie store"),
        }

        if let Err(e) = store.close() {
            warn!(store = %store.name(), error = %e, "failed to close cookie store");
        }
    }

    if cookies.is_empty() {
        return Err(ScrapeError::NoMatchingCookies);
    }

    Ok(cookies)
}

/// A Netscape-format `cookies.txt` export
pub struct NetscapeCookieFile {
    path: PathBuf,
}

impl NetscapeCookieFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CookieSource for NetscapeCookieFile {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_cookies(&mut self, filter: &CookieFilter) -> Result<Vec<BrowserCookie>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| ScrapeError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(parse_netscape_cookies(&content)
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect())
    }
}

/// Discovers cookies.txt exports matching a glob pattern
pub struct GlobCookieFiles {
    pattern: String,
}

impl GlobCookieFiles {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl CookieStoreDiscovery for GlobCookieFiles {
    fn discover(&self) -> Vec<Box<dyn CookieSource>> {
        let paths = match glob::glob(&self.pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(pattern = %self.pattern, error = %e, "invalid cookie file pattern");
                return Vec::new();
            }
        };

        paths
            .filter_map(|p| p.ok())
            .filter(|p| p.is_file())
            .map(|p| Box::new(NetscapeCookieFile::new(p)) as Box<dyn CookieSource>)
            .collect()
    }
}

/// Parse a Netscape cookie file.
///
/// Lines are `domain, include-subdomains, path, secure, expiry, name, value`
/// separated by tabs. `#HttpOnly_` prefixed domains are kept, other `#`
/// lines are comments. An expiry of 0 marks a session cookie.
pub fn parse_netscape_cookies(content: &str) -> Vec<BrowserCookie> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }

            let expiry: i64 = fields[4].trim().parse().ok()?;
            let expires = if expiry == 0 {
                None
            } else {
                Some(DateTime::from_timestamp(expiry, 0)?)
            };

            Some(BrowserCookie {
                domain: fields[0].to_string(),
                name: fields[5].to_string(),
                value: fields[6].trim_end_matches('\r').to_string(),
                expires,
            })
        })
        .collect()
}

/// Bare `name.tld` of a site URL, used to match cookie domains.
///
/// `https://www.nexusmods.com/skyrim` -> `nexusmods.com`
pub fn cookie_domain(url: &str) -> String {
    let prefix = Regex::new(r"^https?://(www\.)?").unwrap();
    let stripped = prefix.replace(url, "");

    let domain = Regex::new(r"^([a-zA-Z0-9-]+\.[a-zA-Z]{2,})(/.*)?$").unwrap();
    match domain.captures(&stripped) {
        Some(caps) => caps[1].to_string(),
        None => stripped.to_string(),
    }
}

/// Run the extract command
pub async fn run_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let data_dir = data_storage_path();

    let output_dir = match args.output_directory {
        Some(dir) => dir,
        None => data_dir
            .clone()
            .context("Could not determine the data storage directory")?,
    };

    let pattern = match args.cookie_files {
        Some(pattern) => pattern,
        None => data_dir
            .context("Could not determine the data storage directory")?
            .join(DEFAULT_COOKIE_EXPORT_GLOB)
            .display()
            .to_string(),
    };

    let domain = cookie_domain(&args.base_url);
    eprintln!("Extracting cookies for {} from {}...", domain, pattern);

    let cookies = extract_cookies(&GlobCookieFiles::new(pattern), &domain, &args.valid_cookie_names)
        .context("Error extracting cookies")?;

    let path = save_cookies_json(&output_dir, &args.output_filename, &cookies)
        .await
        .context("Error saving cookies")?;

    eprintln!("Extracted cookies saved to {}", path.display());
    Ok(())
}
