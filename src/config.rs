//! Defaults shared by the CLI commands

use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://nexusmods.com";
pub const DEFAULT_COOKIE_FILENAME: &str = "session-cookies.json";
pub const DEFAULT_VALID_COOKIES: [&str; 2] = ["nexusmods_session", "nexusmods_session_refresh"];

/// Cookie exports picked up by `extract` when no pattern is given
pub const DEFAULT_COOKIE_EXPORT_GLOB: &str = "*cookies*.txt";

/// Per-user directory for session cookies and scraped mods.
#[cfg(windows)]
pub fn data_storage_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("nexus-mods-scraper").join("data"))
}

/// Per-user directory for session cookies and scraped mods.
#[cfg(not(windows))]
pub fn data_storage_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".nexus-mods-scraper").join("data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_storage_path() {
        let path = data_storage_path().unwrap();
        assert!(path.ends_with("data"));
        assert!(path
            .components()
            .any(|c| c.as_os_str().to_string_lossy().contains("nexus-mods-scraper")));
    }
}
