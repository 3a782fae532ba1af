//! JSON/YAML output for scraped mods and extracted cookies

use crate::error::{Result, ScrapeError};
use crate::schema::{ModRecord, ModResults};
use crate::session::SessionCookies;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Format for results printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Pretty JSON with a custom indent
pub fn to_json_with_indent<T: Serialize>(value: &T, indent: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent));
    value
        .serialize(&mut ser)
        .map_err(|e| ScrapeError::Serialize(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| ScrapeError::Serialize(e.to_string()))
}

/// Render a record for the terminal (no `Mods` wrapper).
pub fn render_record(record: &ModRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json_with_indent(record, b"    "),
        OutputFormat::Yaml => {
            serde_yaml::to_string(record).map_err(|e| ScrapeError::Serialize(e.to_string()))
        }
    }
}

/// Write cookies to `dir/filename` (4-space indent), creating `dir` if needed.
pub async fn save_cookies_json(
    dir: &Path,
    filename: &str,
    cookies: &SessionCookies,
) -> Result<PathBuf> {
    let json = to_json_with_indent(cookies, b"    ")?;
    write_file(dir, &dir.join(filename), json).await
}

/// Write `{"Mods": record}` to `dir/{lowercased name} {mod id}.json` (2-space indent).
pub async fn save_mod_json(dir: &Path, record: &ModRecord) -> Result<PathBuf> {
    let results = ModResults {
        mods: record.clone(),
    };
    let json = serde_json::to_string_pretty(&results)
        .map_err(|e| ScrapeError::Serialize(e.to_string()))?;
    let path = dir.join(mod_filename(record));
    write_file(dir, &path, json).await
}

/// `{lowercased name} {mod id}.json`, with path separators replaced by `_`
pub fn mod_filename(record: &ModRecord) -> String {
    let name = record.name.to_lowercase().replace(['/', '\\'], "_");
    format!("{} {}.json", name, record.mod_id)
}

async fn write_file(dir: &Path, path: &Path, contents: String) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ScrapeError::Export {
            path: dir.to_path_buf(),
            source: e,
        })?;

    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ScrapeError::Export {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!(path = %path.display(), "wrote file");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FileEntry;
    use tempfile::tempdir;

    fn record() -> ModRecord {
        ModRecord {
            name: "Cool Widget".to_string(),
            mod_id: 42,
            files: vec![FileEntry {
                name: "Widget.zip".to_string(),
                version: "1.2".to_string(),
                ..Default::default()
            }],
            latest_version: "1.2".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_cookies_json() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested");
        let mut cookies = SessionCookies::new();
        cookies.insert("session".to_string(), "1234".to_string());

        let path = save_cookies_json(&out, "session-cookies.json", &cookies)
            .await
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "{\n    \"session\": \"1234\"\n}");
    }

    #[tokio::test]
    async fn test_save_cookies_truncates_existing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("c.json"), "x".repeat(500)).unwrap();

        let cookies = SessionCookies::from([("a".to_string(), "b".to_string())]);
        let path = save_cookies_json(dir.path(), "c.json", &cookies).await.unwrap();

        let parsed: SessionCookies =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, cookies);
    }

    #[tokio::test]
    async fn test_save_mod_json() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("skyrim");

        let path = save_mod_json(&out, &record()).await.unwrap();
        assert_eq!(path, out.join("cool widget 42.json"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"Mods\": {\n    \""));

        let parsed: ModResults = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.mods, record());
    }

    #[test]
    fn test_mod_filename_stays_in_dir() {
        let mut record = record();
        record.name = "../Armour/Weapons\\Pack".to_string();
        assert_eq!(mod_filename(&record), ".._armour_weapons_pack 42.json");
        assert_eq!(Path::new(&mod_filename(&record)).components().count(), 1);
    }

    #[test]
    fn test_render_record() {
        let json = render_record(&record(), OutputFormat::Json).unwrap();
        assert!(json.contains("\n    \"LatestVersion\": \"1.2\""));
        assert!(!json.contains("\"Mods\""));

        let yaml = render_record(&record(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("Name: Cool Widget"));
        assert!(yaml.contains("ModID: 42"));
    }
}
