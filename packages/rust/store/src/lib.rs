//! Flat-file artifact persistence, one directory per program.
//!
//! Layout under the configured data directory:
//! - `index.json` — map from program key to [`IndexEntry`] (text chunks
//!   inline, plan path by reference).
//! - `{program}/{program}_page.txt` — newline-joined text fragments.
//! - `{program}/{program}_plan.csv` — curriculum rows, UTF-8 with BOM,
//!   written only when the program has rows.
//!
//! Every file is written wholesale via a temp file plus rename, so a
//! concurrent reader never observes a partial artifact.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use progscout_shared::{CourseRow, ProgScoutError, ProgramCorpus, ProgramKey, Result, TextFragment};

/// UTF-8 byte-order mark, kept so spreadsheet tools detect the encoding.
const BOM: &str = "\u{feff}";

const CSV_HEADER: &str = "title,semester,credits,type";

const INDEX_FILE: &str = "index.json";

// ---------------------------------------------------------------------------
// IndexEntry
// ---------------------------------------------------------------------------

/// One program's record in `index.json`. Text chunks are stored inline;
/// the curriculum lives in its own CSV file, referenced by path, with an
/// empty `plan_path` meaning "no plan document was found".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub program: ProgramKey,
    pub text_chunks: Vec<String>,
    pub plan_path: String,
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Handle on the data directory. Cheap to construct; directories are
/// created on first write.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE)
    }

    /// Persist one program's artifacts and return its index entry.
    ///
    /// The page text file is always written; the plan CSV only when the
    /// corpus has rows, so an absent file (and an empty `plan_path`)
    /// distinguishes "no curriculum" from "empty curriculum".
    #[instrument(skip_all, fields(program = %corpus.program))]
    pub fn save_program(&self, corpus: &ProgramCorpus) -> Result<IndexEntry> {
        let program_dir = self.data_dir.join(corpus.program.as_str());
        fs::create_dir_all(&program_dir).map_err(|e| ProgScoutError::io(&program_dir, e))?;

        let page_path = program_dir.join(format!("{}_page.txt", corpus.program));
        let page_text = corpus
            .fragments
            .iter()
            .map(TextFragment::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        write_atomic(&page_path, page_text.as_bytes())?;

        let plan_path = if corpus.rows.is_empty() {
            String::new()
        } else {
            let path = program_dir.join(format!("{}_plan.csv", corpus.program));
            write_atomic(&path, &plan_csv_bytes(&corpus.rows))?;
            path.to_string_lossy().into_owned()
        };

        debug!(
            fragments = corpus.fragments.len(),
            rows = corpus.rows.len(),
            "program artifacts saved"
        );
        Ok(IndexEntry {
            program: corpus.program.clone(),
            text_chunks: corpus
                .fragments
                .iter()
                .map(|f| f.as_str().to_owned())
                .collect(),
            plan_path,
        })
    }

    /// Replace `index.json` with the given entries (pretty-printed).
    pub fn write_index(&self, index: &BTreeMap<ProgramKey, IndexEntry>) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| ProgScoutError::io(&self.data_dir, e))?;
        let json = serde_json::to_string_pretty(index)
            .map_err(|e| ProgScoutError::Store(format!("index serialization failed: {e}")))?;
        write_atomic(&self.index_path(), json.as_bytes())?;
        debug!(programs = index.len(), "index written");
        Ok(())
    }

    /// Read `index.json`. A missing file is an I/O error (nothing was
    /// ingested yet); a file that does not parse is a store error.
    pub fn read_index(&self) -> Result<BTreeMap<ProgramKey, IndexEntry>> {
        let path = self.index_path();
        let raw = fs::read_to_string(&path).map_err(|e| ProgScoutError::io(&path, e))?;
        serde_json::from_str(&raw).map_err(|e| {
            ProgScoutError::Store(format!("malformed index at {}: {e}", path.display()))
        })
    }

    /// Rebuild a program corpus from its index entry.
    ///
    /// Chunks that no longer satisfy the fragment bounds are dropped. An
    /// unreadable plan file degrades to an empty row list so the text
    /// corpus stays usable.
    pub fn load_program(&self, entry: &IndexEntry) -> ProgramCorpus {
        let fragments: Vec<TextFragment> = entry
            .text_chunks
            .iter()
            .filter_map(TextFragment::new)
            .collect();

        let rows = if entry.plan_path.is_empty() {
            Vec::new()
        } else {
            match fs::read_to_string(&entry.plan_path) {
                Ok(text) => parse_plan_csv(&text),
                Err(e) => {
                    warn!(
                        program = %entry.program,
                        path = %entry.plan_path,
                        error = %e,
                        "plan file unreadable, continuing without curriculum"
                    );
                    Vec::new()
                }
            }
        };

        ProgramCorpus {
            program: entry.program.clone(),
            fragments,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// CSV format
// ---------------------------------------------------------------------------

/// Serialize rows as the plan CSV: BOM, header, one line per row.
/// Usable directly as a downloadable byte stream.
pub fn plan_csv_bytes(rows: &[CourseRow]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(BOM);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let semester = row.semester.map(|s| s.to_string()).unwrap_or_default();
        let credits = row.credits.map(|c| c.to_string()).unwrap_or_default();
        out.push_str(&csv_field(&row.title));
        out.push(',');
        out.push_str(&semester);
        out.push(',');
        out.push_str(&credits);
        out.push(',');
        out.push_str(&csv_field(&row.course_type));
        out.push('\n');
    }
    out.into_bytes()
}

fn parse_plan_csv(text: &str) -> Vec<CourseRow> {
    let mut lines = text.trim_start_matches(BOM).lines();
    if lines.next().is_none() {
        return Vec::new();
    }
    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields = csv_split(line);
            let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");
            CourseRow {
                title: field(0).to_owned(),
                semester: field(1).parse().ok(),
                credits: field(2).parse().ok(),
                course_type: field(3).to_owned(),
            }
        })
        .collect()
}

/// Quote a field when it contains a separator, quote, or newline;
/// embedded quotes double per RFC 4180.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// Split one CSV line into fields, honoring quoted fields and doubled
/// quote escapes.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

/// Write a file wholesale via a dot-prefixed temp file in the same
/// directory plus rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        ProgScoutError::Store(format!("invalid artifact path {}", path.display()))
    })?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&temp, bytes).map_err(|e| ProgScoutError::io(&temp, e))?;
    fs::rename(&temp, path).map_err(|e| ProgScoutError::io(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
