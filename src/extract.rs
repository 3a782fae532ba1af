//! Field extraction from mod pages
//!
//! Scalar fields are described by rule tables of (field, selector, transform).
//! Nested structures
//! (changelogs, requirement tables, tags, file blocks) have dedicated
//! extractors. A missing element always yields an empty value.

use crate::schema::{ChangeLog, FileEntry, ModPage, Requirement};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// How raw element text becomes a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Full cleanup, see [`clean_text`]
    Clean,
    /// Like `Clean`, after dropping text inside elements matching the selector
    CleanExcluding(&'static str),
    /// Outer whitespace only
    Trim,
}

/// Where a selector is evaluated, relative to the element being extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Element,
    /// The next element sibling
    NextSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModField {
    Name,
    LastUpdated,
    OriginalUpload,
    Creator,
    Uploader,
    VirusStatus,
    ShortDescription,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileField {
    Name,
    Version,
    UploadDate,
    FileSize,
    UniqueDownloads,
    TotalDownloads,
    Description,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule<F> {
    pub field: F,
    pub scope: Scope,
    pub path: &'static str,
    pub transform: Transform,
}

const fn rule<F>(field: F, path: &'static str, transform: Transform) -> FieldRule<F> {
    FieldRule {
        field,
        scope: Scope::Element,
        path,
        transform,
    }
}

pub const MOD_PAGE_FIELDS: &[FieldRule<ModField>] = &[
    rule(ModField::Name, "#pagetitle > h1", Transform::Clean),
    rule(
        ModField::LastUpdated,
        "#fileinfo > div:nth-child(2) > time",
        Transform::Clean,
    ),
    rule(
        ModField::OriginalUpload,
        "#fileinfo > div:nth-child(3) > time",
        Transform::Clean,
    ),
    rule(
        ModField::Creator,
        "#fileinfo > div:nth-child(4)",
        Transform::CleanExcluding("h3"),
    ),
    rule(
        ModField::Uploader,
        "#fileinfo > div:nth-child(5) > a",
        Transform::Clean,
    ),
    rule(
        ModField::VirusStatus,
        "#fileinfo > div:nth-child(6) > div > span",
        Transform::Clean,
    ),
    rule(
        ModField::ShortDescription,
        "#section > div > div.wrap.flex > div:nth-child(2) > div > div.tabcontent.tabcontent-mod-page > div.container.tab-description > p",
        Transform::Clean,
    ),
    rule(
        ModField::Description,
        "#section > div > div.wrap.flex > div:nth-child(2) > div > div.tabcontent.tabcontent-mod-page > div.container.mod_description_container.condensed",
        Transform::Clean,
    ),
];

/// One block per downloadable file on the files tab
pub const FILE_HEADER: &str = ".file-expander-header";

pub const FILE_FIELDS: &[FieldRule<FileField>] = &[
    rule(FileField::Name, "p", Transform::Trim),
    rule(FileField::Version, ".stat-version .stat", Transform::Trim),
    rule(FileField::UploadDate, ".stat-uploaddate .stat", Transform::Trim),
    rule(FileField::FileSize, ".stat-filesize .stat", Transform::Trim),
    rule(FileField::UniqueDownloads, ".stat-uniquedls .stat", Transform::Trim),
    rule(FileField::TotalDownloads, ".stat-totaldls .stat", Transform::Trim),
    // The description is rendered in the block after the header
    FieldRule {
        field: FileField::Description,
        scope: Scope::NextSibling,
        path: ".tabbed-block.files-description",
        transform: Transform::Trim,
    },
];

pub const CHANGELOG_BLOCKS: &str = "#section > div > div.wrap.flex > div:nth-child(2) > div > div.tabcontent.tabcontent-mod-page > div.container.tab-description > div.accordionitems > dl > dd:nth-child(8) > div > ul > li";
const CHANGELOG_VERSION: &str = "h3";
const CHANGELOG_NOTES: &str = "div.log-change > ul > li";

pub const REQUIREMENTS_TITLE: &str = "Nexus requirements";
pub const MODS_USING_TITLE: &str = "Mods requiring this file";
const REQUIREMENT_BLOCK: &str = "div.tabbed-block";
const REQUIREMENT_TITLE: &str = "h3";
const REQUIREMENT_ROWS: &str = "table.table.desc-table tbody tr";
const REQUIREMENT_NAME: &str = "td.table-require-name a";
const REQUIREMENT_NOTES: &str = "td.table-require-notes";

pub const TAG_LABELS: &str = ".sideitems.side-tags .tags li a span.flex-label";

/// Normalize scraped text.
///
/// Literal `\n` escapes become newlines, surrounding quotes are dropped and
/// each line has its whitespace collapsed. Empty lines are discarded. Two
/// remaining lines are joined with `", "` (the "label / value" layout used
/// throughout the site), anything else with a single space.
pub fn clean_text(input: &str) -> String {
    let text = input.replace("\\n", "\n");
    let text = text.trim_matches('"');

    let lines: Vec<String> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect();

    let joined = if lines.len() == 2 {
        lines.join(", ")
    } else {
        lines.join(" ")
    };

    joined
        .trim_matches(|c: char| c == '"' || c.is_whitespace())
        .to_string()
}

/// Extract all main-page fields.
pub fn extract_mod_page(doc: &Html) -> ModPage {
    let root = doc.root_element();
    let mut page = ModPage::default();

    for rule in MOD_PAGE_FIELDS {
        let value = apply_rule(root, rule);
        *mod_field_mut(&mut page, rule.field) = value;
    }

    page.change_logs = extract_change_logs(doc);
    page.tags = extract_tags(doc);
    page.dependencies = extract_requirements(doc, REQUIREMENTS_TITLE);
    page.mods_using = extract_requirements(doc, MODS_USING_TITLE);
    page
}

/// Extract every file block from the files tab, in page order.
pub fn extract_files(doc: &Html) -> Vec<FileEntry> {
    let Some(header) = selector(FILE_HEADER) else {
        return Vec::new();
    };

    doc.select(&header)
        .map(|block| {
            let mut file = FileEntry::default();
            for rule in FILE_FIELDS {
                let value = apply_rule(block, rule);
                *file_field_mut(&mut file, rule.field) = value;
            }
            file
        })
        .collect()
}

/// Versioned changelog entries. Blocks without a version or notes are dropped.
pub fn extract_change_logs(doc: &Html) -> Vec<ChangeLog> {
    let (Some(blocks), Some(version), Some(notes)) = (
        selector(CHANGELOG_BLOCKS),
        selector(CHANGELOG_VERSION),
        selector(CHANGELOG_NOTES),
    ) else {
        return Vec::new();
    };

    doc.select(&blocks)
        .filter_map(|block| {
            let version = text_of(block.select(&version)).trim().to_string();
            let notes: Vec<String> = block
                .select(&notes)
                .map(|li| li.text().collect::<String>().trim().to_string())
                .filter(|note| !note.is_empty())
                .collect();

            if version.is_empty() || notes.is_empty() {
                None
            } else {
                Some(ChangeLog { notes, version })
            }
        })
        .collect()
}

/// Rows of the requirement table headed `table_title`; empty when absent.
pub fn extract_requirements(doc: &Html, table_title: &str) -> Vec<Requirement> {
    let (Some(block), Some(title), Some(rows), Some(name), Some(notes)) = (
        selector(REQUIREMENT_BLOCK),
        selector(REQUIREMENT_TITLE),
        selector(REQUIREMENT_ROWS),
        selector(REQUIREMENT_NAME),
        selector(REQUIREMENT_NOTES),
    ) else {
        return Vec::new();
    };

    let Some(block) = doc
        .select(&block)
        .find(|b| text_of(b.select(&title)) == table_title)
    else {
        return Vec::new();
    };

    block
        .select(&rows)
        .map(|row| Requirement {
            name: text_of(row.select(&name)).trim().to_string(),
            notes: text_of(row.select(&notes)).trim().to_string(),
        })
        .collect()
}

/// Tag labels from the side panel, in page order, duplicates kept.
pub fn extract_tags(doc: &Html) -> Vec<String> {
    let Some(labels) = selector(TAG_LABELS) else {
        return Vec::new();
    };

    doc.select(&labels)
        .map(|label| label.text().collect::<String>().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn apply_rule<F>(element: ElementRef<'_>, rule: &FieldRule<F>) -> String {
    let scope = match rule.scope {
        Scope::Element => Some(element),
        Scope::NextSibling => element.next_siblings().find_map(ElementRef::wrap),
    };
    let (Some(scope), Some(sel)) = (scope, selector(rule.path)) else {
        return String::new();
    };

    match rule.transform {
        Transform::Clean => clean_text(&text_of(scope.select(&sel))),
        Transform::Trim => text_of(scope.select(&sel)).trim().to_string(),
        Transform::CleanExcluding(excluded) => scope
            .select(&sel)
            .next()
            .map(|el| clean_text(&text_excluding(el, excluded)))
            .unwrap_or_default(),
    }
}

/// Concatenated text of every matched element
fn text_of<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> String {
    elements.flat_map(|el| el.text()).collect()
}

/// Text of `element`, skipping anything inside descendants matching `excluded`
fn text_excluding(element: ElementRef<'_>, excluded: &str) -> String {
    let Some(excluded) = selector(excluded) else {
        return element.text().collect();
    };

    let skipped: HashSet<_> = element
        .select(&excluded)
        .filter(|el| el.id() != element.id())
        .flat_map(|el| el.descendants().map(|node| node.id()))
        .collect();

    element
        .descendants()
        .filter(|node| !skipped.contains(&node.id()))
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect()
}

fn selector(path: &str) -> Option<Selector> {
    Selector::parse(path).ok()
}

fn mod_field_mut(page: &mut ModPage, field: ModField) -> &mut String {
    match field {
        ModField::Name => &mut page.name,
        ModField::LastUpdated => &mut page.last_updated,
        ModField::OriginalUpload => &mut page.original_upload,
        ModField::Creator => &mut page.creator,
        ModField::Uploader => &mut page.uploader,
        ModField::VirusStatus => &mut page.virus_status,
        ModField::ShortDescription => &mut page.short_description,
        ModField::Description => &mut page.description,
    }
}

fn file_field_mut(file: &mut FileEntry, field: FileField) -> &mut String {
    match field {
        FileField::Name => &mut file.name,
        FileField::Version => &mut file.version,
        FileField::UploadDate => &mut file.upload_date,
        FileField::FileSize => &mut file.file_size,
        FileField::UniqueDownloads => &mut file.unique_downloads,
        FileField::TotalDownloads => &mut file.total_downloads,
        FileField::Description => &mut file.description,
    }
}
