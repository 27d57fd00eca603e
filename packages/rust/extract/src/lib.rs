//! Visible-text extraction from program pages.
//!
//! Turns raw HTML into the ordered fragment list the index is built on:
//! 1. Strip non-content subtrees (scripts, styles, page chrome)
//! 2. Flatten the rest to visible text
//! 3. Segment on sentence-ending punctuation or newline runs
//! 4. Drop noise-length segments, window anything too long
//!
//! Malformed HTML never fails here; the parser recovers and extraction
//! yields whatever text is reachable.

mod links;

pub use links::find_curriculum_link;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

use progscout_shared::{MAX_FRAGMENT_CHARS, TextFragment};

/// Subtrees dropped before text collection: page chrome, not content.
const SKIP_TAGS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

/// Segment boundary: sentence-ending punctuation followed by whitespace,
/// or a newline run.
static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+|\n+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Text extraction
// ---------------------------------------------------------------------------

/// Extract the ordered fragment sequence from a program page.
///
/// Order follows document order. Every returned fragment satisfies the
/// shared length bounds; segments longer than [`MAX_FRAGMENT_CHARS`] are
/// cut into fixed-size character windows (no overlap) and window tails
/// below the minimum are discarded with the rest of the noise.
#[instrument(skip_all)]
pub fn extract_text(html: &str) -> Vec<TextFragment> {
    let flat = visible_text(html);
    let mut fragments = Vec::new();

    for segment in segment_boundaries(&flat) {
        let segment = segment.trim();
        if segment.chars().count() > MAX_FRAGMENT_CHARS {
            for window in char_windows(segment, MAX_FRAGMENT_CHARS) {
                fragments.extend(TextFragment::new(window));
            }
        } else {
            fragments.extend(TextFragment::new(segment));
        }
    }

    debug!(fragments = fragments.len(), "extracted page text");
    fragments
}

/// Collapse a document to its visible text: walk the tree, skip
/// [`SKIP_TAGS`] subtrees, trim each text node, join with single spaces.
fn visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();
    collect_text(doc.root_element(), &mut parts);
    parts.join(" ")
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    if SKIP_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed);
            }
        } else if let Some(el) = ElementRef::wrap(child) {
            collect_text(el, out);
        }
    }
}

/// Split flat text into sentence-ish segments. Punctuation stays with the
/// segment it ends; the whitespace (or newline run) at the boundary is
/// consumed.
fn segment_boundaries(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in SEGMENT_RE.find_iter(text) {
        // The punctuation branch starts on the punctuation character
        // itself, which belongs to the left-hand segment.
        let boundary = if text[m.start()..].starts_with(['.', '!', '?']) {
            m.start() + 1
        } else {
            m.start()
        };
        if boundary > last {
            segments.push(&text[last..boundary]);
        }
        last = m.end();
    }
    if last < text.len() {
        segments.push(&text[last..]);
    }

    segments
}

/// Cut `text` into consecutive windows of at most `size` characters,
/// slicing on character boundaries.
fn char_windows(text: &str, size: usize) -> Vec<&str> {
    let mut windows = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            windows.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        windows.push(&text[start..]);
    }

    windows
}
