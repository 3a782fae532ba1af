//! Mod record schema
//!
//! Serialized shape of a scraped mod, as written by `scrape --save-results`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root structure of an exported mod file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModResults {
    #[serde(rename = "Mods")]
    pub mods: ModRecord,
}

/// Everything scraped about a single mod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModRecord {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub change_logs: Vec<ChangeLog>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creator: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Requirement>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_updated: String,
    /// Version of the first listed file
    #[serde(skip_serializing_if = "String::is_empty")]
    pub latest_version: String,
    #[serde(rename = "ModID", skip_serializing_if = "is_zero")]
    pub mod_id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mods_using: Vec<Requirement>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub original_upload: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub short_description: String,
    /// Page order, duplicates kept
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uploader: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub virus_status: String,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// One version block of the changelog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ChangeLog {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// A row of the requirements / "mods requiring this file" tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Requirement {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// A downloadable file from the files tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileEntry {
    pub description: String,
    pub file_size: String,
    pub name: String,
    pub total_downloads: String,
    pub unique_downloads: String,
    pub upload_date: String,
    pub version: String,
}

/// Fields owned by the main-page task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModPage {
    pub name: String,
    pub creator: String,
    pub uploader: String,
    pub short_description: String,
    pub description: String,
    pub virus_status: String,
    pub last_updated: String,
    pub original_upload: String,
    pub change_logs: Vec<ChangeLog>,
    pub tags: Vec<String>,
    pub dependencies: Vec<Requirement>,
    pub mods_using: Vec<Requirement>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl ModRecord {
    /// Merge the outputs of both page tasks into one record.
    pub fn assemble(mod_id: i64, url: String, page: ModPage, files: Vec<FileEntry>) -> Self {
        let latest_version = files
            .first()
            .map(|f| f.version.clone())
            .unwrap_or_default();

        Self {
            change_logs: page.change_logs,
            creator: page.creator,
            dependencies: page.dependencies,
            description: page.description,
            files,
            last_checked: page.last_checked,
            last_updated: page.last_updated,
            latest_version,
            mod_id,
            mods_using: page.mods_using,
            name: page.name,
            original_upload: page.original_upload,
            short_description: page.short_description,
            tags: page.tags,
            uploader: page.uploader,
            url,
            virus_status: page.virus_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, version: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            version: version.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_latest_version_from_first_file() {
        let page = ModPage {
            name: "Widget".to_string(),
            ..Default::default()
        };
        let record = ModRecord::assemble(
            42,
            "https://nexusmods.com/skyrim/mods/42".to_string(),
            page,
            vec![file("Widget.zip", "1.2"), file("Widget-old.zip", "1.1")],
        );
        assert_eq!(record.latest_version, "1.2");
        assert_eq!(record.name, "Widget");
        assert_eq!(record.mod_id, 42);
    }

    #[test]
    fn test_latest_version_empty_without_files() {
        let record = ModRecord::assemble(1, String::new(), ModPage::default(), vec![]);
        assert_eq!(record.latest_version, "");
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let results = ModResults {
            mods: ModRecord {
                name: "Widget".to_string(),
                mod_id: 42,
                files: vec![file("Widget.zip", "1.2")],
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&results).unwrap();
        assert!(json.starts_with(r#"{"Mods":{"#));
        assert!(json.contains(r#""Name":"Widget""#));
        assert!(json.contains(r#""ModID":42"#));
        assert!(json.contains(r#""uploadDate":"""#));
        assert!(!json.contains("Creator"));
        assert!(!json.contains("Tags"));
        assert!(!json.contains("LastChecked"));
    }

    #[test]
    fn test_deserialize_partial_record() {
        let json = r#"{"Mods":{"Name":"Widget","ModID":3,"Tags":["Armour"]}}"#;
        let parsed: ModResults = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.mods.name, "Widget");
        assert_eq!(parsed.mods.mod_id, 3);
        assert_eq!(parsed.mods.tags, vec!["Armour".to_string()]);
        assert!(parsed.mods.files.is_empty());
    }
}
