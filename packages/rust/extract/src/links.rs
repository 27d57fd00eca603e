//! Curriculum document link discovery.
//!
//! Program pages link their curriculum as a downloadable PDF. The anchor
//! text is the reliable signal ("Скачать учебный план" on the source
//! site); href heuristics are the fallback. Finding nothing is a valid
//! outcome, not an error: the caller skips curriculum parsing.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use progscout_shared::{LinkKeywords, matches_any};

/// Extensions that mark an href as a downloadable document.
const DOC_EXTENSIONS: [&str; 1] = [".pdf"];

/// Locate the curriculum document link on a program page.
///
/// Two passes over the anchors:
/// 1. Visible anchor text containing both a "download" word and a
///    "curriculum" word from the keyword table.
/// 2. Any href ending in a document extension or containing one of the
///    configured href hints.
///
/// Relative targets are resolved against `base_url` (the page URL).
pub fn find_curriculum_link(html: &str, base_url: &Url, keywords: &LinkKeywords) -> Option<Url> {
    let doc = Html::parse_document(html);

    let anchor_sel = Selector::parse("a").expect("valid selector");
    for el in doc.select(&anchor_sel) {
        let text = el.text().collect::<String>();
        if matches_any(&text, &keywords.download) && matches_any(&text, &keywords.curriculum) {
            if let Some(href) = el.value().attr("href") {
                if let Ok(resolved) = base_url.join(href) {
                    debug!(url = %resolved, "curriculum link found via anchor text");
                    return Some(resolved);
                }
            }
        }
    }

    let href_sel = Selector::parse("a[href]").expect("valid selector");
    for el in doc.select(&href_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let lower = href.to_lowercase();
        let looks_like_document = DOC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
            || keywords
                .href_hints
                .iter()
                .any(|hint| lower.contains(hint.as_str()));
        if looks_like_document {
            if let Ok(resolved) = base_url.join(href) {
                debug!(url = %resolved, "curriculum link found via href fallback");
                return Some(resolved);
            }
        }
    }

    debug!("no curriculum link on page");
    None
}
