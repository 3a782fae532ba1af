//! Authenticated page fetches
//!
//! Every request carries an explicit `Cookie` header built from the session
//! jar, then the body is parsed into a `scraper::Html` tree.

use crate::error::{Result, ScrapeError};
use crate::session::Session;
use reqwest::header::{COOKIE, LOCATION};
use reqwest::{Response, StatusCode};
use scraper::Html;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// Issues cookie-authenticated GETs through a shared session
#[derive(Clone)]
pub struct DocumentFetcher {
    session: Arc<Session>,
}

impl DocumentFetcher {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Fetch `target` and parse it into a document tree.
    pub async fn fetch_document(&self, target: &str) -> Result<Html> {
        let body = self.fetch_body(target).await?;
        parse_document(target, &body)
    }

    /// Fetch `target` and return the body. Only HTTP 200 is accepted.
    ///
    /// Redirects are followed by hand and the `Cookie` header is rebuilt from
    /// the jar for every hop.
    pub async fn fetch_body(&self, target: &str) -> Result<String> {
        let mut url = Url::parse(target).map_err(|e| ScrapeError::RequestConstruction {
            url: target.to_string(),
            reason: e.to_string(),
        })?;
        let client = self.session.client();

        for _ in 0..=MAX_REDIRECTS {
            let mut request = client
                .get(url.clone())
                .build()
                .map_err(|e| ScrapeError::RequestConstruction {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

            if let Some(cookies) = self.session.cookie_header(&url) {
                request.headers_mut().insert(COOKIE, cookies);
            }

            let response = client.execute(request).await?;
            let status = response.status();
            debug!(url = %url, status = status.as_u16(), "fetched");

            if status.is_redirection() {
                if let Some(next) = redirect_target(&url, &response) {
                    debug!(from = %url, to = %next, "following redirect");
                    url = next;
                    continue;
                }
            }

            if status != StatusCode::OK {
                return Err(ScrapeError::UnexpectedStatus {
                    url: target.to_string(),
                    status: status.as_u16(),
                });
            }

            let bytes = response.bytes().await?;
            return String::from_utf8(bytes.to_vec()).map_err(|e| ScrapeError::Parse {
                url: target.to_string(),
                reason: e.to_string(),
            });
        }

        Err(ScrapeError::TooManyRedirects {
            url: target.to_string(),
        })
    }
}

/// Absolute http(s) URL named by the `Location` header
fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    let next = current.join(location).ok()?;
    matches!(next.scheme(), "http" | "https").then_some(next)
}

/// Parse an HTML body. Blank bodies are rejected.
pub fn parse_document(url: &str, body: &str) -> Result<Html> {
    if body.trim().is_empty() {
        return Err(ScrapeError::Parse {
            url: url.to_string(),
            reason: "empty document".to_string(),
        });
    }

    Ok(Html::parse_document(body))
}
