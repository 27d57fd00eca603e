//! Curriculum document parsing.
//!
//! Turns a downloaded curriculum PDF into structured [`CourseRow`]s.
//! Best-effort by contract: curriculum documents have no fixed schema
//! across programs, so parsing classifies table columns by keyword and
//! degrades gracefully — tables without a recognizable title column are
//! skipped, and a wholly unparseable document yields an empty row list,
//! never an error.

mod grid;

use std::collections::HashSet;
use std::sync::LazyLock;

use lopdf::Document;
use regex::Regex;
use tracing::{debug, instrument, warn};

use progscout_shared::{ColumnKeywords, CourseRow, MIN_TITLE_CHARS, matches_any};

static DIGIT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a curriculum PDF into course rows.
///
/// Extracts text page by page, reconstructs embedded tables, and maps
/// them to rows. A document that fails to load, and any page whose text
/// cannot be extracted, contributes nothing.
#[instrument(skip_all, fields(bytes = bytes.len()))]
pub fn parse_pdf(bytes: &[u8], keywords: &ColumnKeywords) -> Vec<CourseRow> {
    parse_pages(&page_texts(bytes), keywords)
}

/// Parse already-extracted page texts into course rows.
///
/// Tables are maximal runs of consecutive multi-cell lines. The first
/// row of each table is its header; header cells are classified into
/// title / semester / credits / type roles by keyword, and a table
/// contributes rows only if a title column was identified. Raw rows are
/// deduplicated by full-field equality (first occurrence wins) before
/// the semester and credits cells are normalized.
pub fn parse_pages(pages: &[impl AsRef<str>], keywords: &ColumnKeywords) -> Vec<CourseRow> {
    let mut raw: Vec<RawRow> = Vec::new();
    for page in pages {
        for table in grid::grids_from_page(page.as_ref()) {
            collect_rows(&table, keywords, &mut raw);
        }
    }

    let mut seen = HashSet::new();
    raw.retain(|row| seen.insert(row.clone()));

    debug!(rows = raw.len(), pages = pages.len(), "curriculum parsed");
    raw.into_iter().map(RawRow::normalize).collect()
}

/// Per-page text of a PDF. Load or extraction failures surface as a
/// warning and an empty/shorter result, never as an error.
fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "curriculum document failed to load");
            return Vec::new();
        }
    };

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                debug!(page = page_number, error = %e, "page text extraction failed, skipping")
            }
        }
    }
    pages
}

// ---------------------------------------------------------------------------
// Header classification and row collection
// ---------------------------------------------------------------------------

/// Column indexes of the four semantic roles within one table. When
/// several header cells match the same role, the last match wins.
#[derive(Debug, Default, Clone, Copy)]
struct ColumnMap {
    title: Option<usize>,
    semester: Option<usize>,
    credits: Option<usize>,
    kind: Option<usize>,
}

fn classify_header(header: &[String], keywords: &ColumnKeywords) -> ColumnMap {
    let mut map = ColumnMap::default();
    for (i, cell) in header.iter().enumerate() {
        if matches_any(cell, &keywords.title) {
            map.title = Some(i);
        }
        if matches_any(cell, &keywords.semester) {
            map.semester = Some(i);
        }
        if matches_any(cell, &keywords.credits) {
            map.credits = Some(i);
        }
        if matches_any(cell, &keywords.kind) {
            map.kind = Some(i);
        }
    }
    map
}

fn collect_rows(table: &[Vec<String>], keywords: &ColumnKeywords, out: &mut Vec<RawRow>) {
    let Some((header, data)) = table.split_first() else {
        return;
    };
    let map = classify_header(header, keywords);
    let Some(title_idx) = map.title else {
        debug!(columns = header.len(), "table without a title column, skipped");
        return;
    };

    for row in data {
        let title = row.get(title_idx).map(|c| c.trim()).unwrap_or("");
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }
        out.push(RawRow {
            title: title.to_owned(),
            semester: cell(row, map.semester),
            credits: cell(row, map.credits),
            kind: cell(row, map.kind),
        });
    }
}

fn cell(row: &[String], idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(|c| c.trim().to_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// A data row as it appears in the table, before any normalization.
/// Kept string-typed so rows deduplicate on what the document said,
/// not on what we parsed out of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RawRow {
    title: String,
    semester: String,
    credits: String,
    kind: String,
}

impl RawRow {
    fn normalize(self) -> CourseRow {
        CourseRow {
            title: self.title,
            semester: first_digit_run(&self.semester),
            credits: first_decimal(&self.credits),
            course_type: self.kind,
        }
    }
}

/// First embedded run of digits, e.g. `"1-2 семестр"` → 1.
fn first_digit_run(text: &str) -> Option<u32> {
    DIGIT_RUN_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// First embedded decimal number, with comma decimal separators
/// normalized first, e.g. `"4,5 ЗЕ"` → 4.5.
fn first_decimal(text: &str) -> Option<f64> {
    let normalized = text.replace(',', ".");
    DECIMAL_RE
        .find(&normalized)
        .and_then(|m| m.as_str().parse().ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn keywords() -> ColumnKeywords {
        ColumnKeywords::default()
    }

    /// One-page PDF with a text line per table row, cells separated by
    /// multi-space runs. ASCII only: the simple Type1 font round-trips
    /// ASCII through lopdf's text extraction.
    fn table_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
            operations.push(Operation::new(
                "Td",
                vec![50.into(), (760 - 16 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save pdf");
        buffer
    }

    #[test]
    fn parses_russian_header_and_row() {
        let page = "Дисциплина\tСеместр\tЗЕ\tВид\n\
                    Машинное обучение\t1\t4\tЭлективный\n";
        let rows = parse_pages(&[page], &keywords());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Машинное обучение");
        assert_eq!(rows[0].semester, Some(1));
        assert_eq!(rows[0].credits, Some(4.0));
        assert_eq!(rows[0].course_type, "Элективный");
    }

    #[test]
    fn table_without_title_column_contributes_nothing() {
        let page = "Семестр\tЗЕ\n1\t4\n2\t3\n";
        assert!(parse_pages(&[page], &keywords()).is_empty());
    }

    #[test]
    fn missing_optional_columns_stay_absent() {
        let page = "Дисциплина\tВид\nГлубокое обучение\tЭлективный\n";
        let rows = parse_pages(&[page], &keywords());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].semester, None);
        assert_eq!(rows[0].credits, None);
    }

    #[test]
    fn short_or_empty_titles_are_skipped() {
        let page = "Семестр | Дисциплина | ЗЕ\n\
                    1 | X | 4\n\
                    2 |  | 3\n\
                    1 | Нормальный курс | 5\n";
        let rows = parse_pages(&[page], &keywords());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Нормальный курс");
        assert_eq!(rows[0].credits, Some(5.0));
    }

    #[test]
    fn rows_deduplicate_across_pages() {
        let page = "Дисциплина\tСеместр\nМатематическая статистика\t2\n";
        let rows = parse_pages(&[page, page], &keywords());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn semester_and_credits_normalize_embedded_values() {
        let page = "Дисциплина\tСеместр\tЗЕ\n\
                    Анализ данных\t1-2 семестр\t4,5 ЗЕ\n\
                    Семинар по этике\tосенний\tнет\n";
        let rows = parse_pages(&[page], &keywords());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].semester, Some(1));
        assert_eq!(rows[0].credits, Some(4.5));
        assert_eq!(rows[1].semester, None);
        assert_eq!(rows[1].credits, None);
    }

    #[test]
    fn english_headers_classify_too() {
        let page = "Course  Semester  Credits  Type\n\
                    Applied statistics  2  3  Elective\n";
        let rows = parse_pages(&[page], &keywords());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Applied statistics");
        assert_eq!(rows[0].semester, Some(2));
    }

    #[test]
    fn parsing_is_idempotent() {
        let page = "Дисциплина\tСеместр\tЗЕ\tВид\n\
                    Машинное обучение\t1\t4\tЭлективный\n\
                    Инженерия данных\t2\t3\tОбязательный\n";
        let first = parse_pages(&[page], &keywords());
        let second = parse_pages(&[page], &keywords());
        assert_eq!(first, second);
    }

    #[test]
    fn unparseable_bytes_yield_empty_rows() {
        assert!(parse_pdf(b"not a pdf at all", &keywords()).is_empty());
        assert!(parse_pdf(b"", &keywords()).is_empty());
    }

    #[test]
    fn pdf_round_trip_produces_rows() {
        let bytes = table_pdf(&[
            "Course   Semester   Credits   Type",
            "Machine learning workshop   1   4   Elective",
            "Data pipelines in practice   2   3   Elective",
        ]);
        let rows = parse_pdf(&bytes, &keywords());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Machine learning workshop");
        assert_eq!(rows[0].semester, Some(1));
        assert_eq!(rows[0].credits, Some(4.0));
        assert_eq!(rows[0].course_type, "Elective");
        assert_eq!(rows[1].title, "Data pipelines in practice");
    }

    #[test]
    fn pdf_prose_between_tables_is_ignored() {
        let bytes = table_pdf(&[
            "The curriculum below lists elective courses.",
            "Course   Semester",
            "Applied optimization   2",
        ]);
        let rows = parse_pdf(&bytes, &keywords());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Applied optimization");
    }
}
