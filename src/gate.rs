//! Adult-content gate detection
//!
//! When the session is not logged in (or has not opted in to adult content)
//! the mod page still returns 200, but the title heading is replaced with a
//! placeholder. Callers turn a hit into `ScrapeError::AdultContentGated`.

use scraper::{Html, Selector};

/// Heading text shown in place of the mod title on gated pages
pub const GATED_TITLE: &str = "Adult content";

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// True when the heading `#{mod_id}-title` reads exactly [`GATED_TITLE`].
pub fn is_adult_content(doc: &Html, mod_id: i64) -> bool {
    // Ids starting with a digit are not valid `#id` selectors
    let selector = HEADINGS
        .iter()
        .map(|h| format!(r#"{}[id="{}-title"]"#, h, mod_id))
        .collect::<Vec<_>>()
        .join(", ");

    let Ok(selector) = Selector::parse(&selector) else {
        return false;
    };

    doc.select(&selector)
        .next()
        .map(|heading| heading.text().collect::<String>() == GATED_TITLE)
        .unwrap_or(false)
}
