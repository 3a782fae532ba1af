//! HTTP session with replayed browser cookies
//!
//! Cookies captured by `extract` are loaded from a flat JSON object and
//! installed into the session's jar for a single domain and its subdomains.
//! The jar is never handed to the client as a cookie provider: requests
//! attach the `Cookie` header explicitly and redirects are followed by hand
//! (see `fetch`).

use crate::error::{Result, ScrapeError};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use url::{Host, Url};

/// Cookie name -> value, as captured from the browser
pub type SessionCookies = BTreeMap<String, String>;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client plus the cookie jar it reads from
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
}

impl Session {
    /// Create a session with an empty cookie jar
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            jar: Arc::new(Jar::default()),
        })
    }

    /// Create a session and install the cookies stored in `dir/filename` for `domain`.
    pub async fn bootstrap(domain: &str, dir: &Path, filename: &str) -> Result<Self> {
        let cookies = load_cookie_file(&dir.join(filename)).await?;
        let session = Self::new()?;
        session.install_cookies(domain, &cookies)?;
        Ok(session)
    }

    /// Install every cookie for `domain`, or none if the domain or any cookie is invalid.
    pub fn install_cookies(&self, domain: &str, cookies: &SessionCookies) -> Result<()> {
        let url = parse_domain(domain)?;
        for (name, value) in cookies {
            validate_cookie(name, value)?;
        }

        let scope = cookie_scope(&url);
        for (name, value) in cookies {
            let cookie = match &scope {
                Some(domain) => format!("{}={}; Domain={}", name, value, domain),
                None => format!("{}={}", name, value),
            };
            self.jar.add_cookie_str(&cookie, &url);
        }

        info!(count = cookies.len(), domain = %url, "installed session cookies");
        Ok(())
    }

    /// `Cookie` header value for `url`, if the jar holds any matching cookie
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Read a flat string-to-string JSON object from `path`.
pub async fn load_cookie_file(path: &Path) -> Result<SessionCookies> {
    debug!(path = %path.display(), "reading cookie file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScrapeError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ScrapeError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

    serde_json::from_str(&content).map_err(|e| ScrapeError::Decode {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_domain(domain: &str) -> Result<Url> {
    let url = Url::parse(domain).map_err(|e| ScrapeError::DomainParse {
        domain: domain.to_string(),
        source: e,
    })?;

    if url.host_str().is_none() {
        return Err(ScrapeError::DomainParse {
            domain: domain.to_string(),
            source: url::ParseError::EmptyHost,
        });
    }

    Ok(url)
}

/// Domain attribute covering the host and its subdomains (`www.` dropped).
/// IP addresses and single-label hosts stay host-only.
fn cookie_scope(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(host) => {
            let host = host.strip_prefix("www.").unwrap_or(host);
            host.contains('.').then(|| host.to_string())
        }
        _ => None,
    }
}

/// Reject anything the jar would silently drop or truncate.
fn validate_cookie(name: &str, value: &str) -> Result<()> {
    let invalid = |reason: &str| ScrapeError::InvalidCookie {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if name.chars().any(|c| c == '=' || is_separator(c)) {
        return Err(invalid("name contains a separator"));
    }
    if value.chars().any(is_separator) {
        return Err(invalid("value contains a separator"));
    }
    Ok(())
}

fn is_separator(c: char) -> bool {
    matches!(c, ';' | ',' | '"' | '\\') || c.is_whitespace() || c.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_bootstrap_installs_cookies() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("session-cookies.json"),
            r#"{"nexusmods_session": "abc123"}"#,
        )
        .unwrap();

        let session = Session::bootstrap("https://nexusmods.com", dir.path(), "session-cookies.json")
            .await
            .unwrap();

        let url = Url::parse("https://nexusmods.com/skyrim/mods/42").unwrap();
        let header = session.cookie_header(&url).unwrap();
        assert_eq!(header.to_str().unwrap(), "nexusmods_session=abc123");
    }

    #[tokio::test]
    async fn test_cookies_scoped_to_domain() {
        let session = Session::new().unwrap();
        let mut cookies = SessionCookies::new();
        cookies.insert("a".to_string(), "1".to_string());
        session
            .install_cookies("https://nexusmods.com", &cookies)
            .unwrap();

        let other = Url::parse("https://example.com/").unwrap();
        assert!(session.cookie_header(&other).is_none());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = Session::bootstrap("https://nexusmods.com", dir.path(), "missing.json")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ScrapeError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_nested_json_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"{"session": {"value": "x"}}"#).unwrap();

        let err = load_cookie_file(&path).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Decode { .. }));
    }

    #[test]
    fn test_invalid_domain() {
        let session = Session::new().unwrap();
        let mut cookies = SessionCookies::new();
        cookies.insert("a".to_string(), "1".to_string());

        let err = session.install_cookies("nexusmods.com", &cookies).unwrap_err();
        assert!(matches!(err, ScrapeError::DomainParse { .. }));

        let err = session.install_cookies("data:text/plain,hi", &cookies).unwrap_err();
        assert!(matches!(err, ScrapeError::DomainParse { .. }));
    }

    #[test]
    fn test_invalid_cookie_installs_nothing() {
        let url = Url::parse("https://nexusmods.com/").unwrap();
        let bad = [("", "empty-name"), ("semi", "a;b"), ("spacey", "x y"), ("a=b", "1")];

        for (name, value) in bad {
            let session = Session::new().unwrap();
            let cookies = SessionCookies::from([
                ("good".to_string(), "1".to_string()),
                (name.to_string(), value.to_string()),
            ]);

            let err = session
                .install_cookies("https://nexusmods.com", &cookies)
                .unwrap_err();
            assert!(matches!(err, ScrapeError::InvalidCookie { .. }), "{name:?}");
            assert!(session.cookie_header(&url).is_none(), "{name:?}");
        }
    }

    #[test]
    fn test_cookies_reach_subdomains() {
        let session = Session::new().unwrap();
        let cookies = SessionCookies::from([("nexusmods_session".to_string(), "abc".to_string())]);
        session
            .install_cookies("https://nexusmods.com", &cookies)
            .unwrap();

        let www = Url::parse("https://www.nexusmods.com/skyrim/mods/42").unwrap();
        let header = session.cookie_header(&www).unwrap();
        assert_eq!(header.to_str().unwrap(), "nexusmods_session=abc");
    }

    #[test]
    fn test_multiple_cookies_joined() {
        let session = Session::new().unwrap();
        let cookies = SessionCookies::from([
            ("nexusmods_session".to_string(), "abc".to_string()),
            ("nexusmods_session_refresh".to_string(), "def".to_string()),
        ]);
        session
            .install_cookies("https://nexusmods.com", &cookies)
            .unwrap();

        let url = Url::parse("https://nexusmods.com/").unwrap();
        let header = session.cookie_header(&url).unwrap();
        let mut pairs: Vec<&str> = header.to_str().unwrap().split("; ").collect();
        pairs.sort();
        assert_eq!(pairs, ["nexusmods_session=abc", "nexusmods_session_refresh=def"]);
    }
}
