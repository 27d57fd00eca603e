//! Line-grid reconstruction from extracted page text.
//!
//! Curriculum tables come out of the text layer as plain lines whose cells
//! are separated by tab runs, multi-space runs, or pipe characters. This
//! module rebuilds those lines into rectangular grids: a grid is a maximal
//! run of consecutive lines that each split into at least two cells.

use std::sync::LazyLock;

use regex::Regex;

/// Rows of trimmed cells, header first.
pub(crate) type Grid = Vec<Vec<String>>;

// Pipe separators absorb surrounding whitespace so `a | b` yields two cells,
// not three. The pipe branch must come first: the space-run branch would
// otherwise split in front of the pipe and leave an empty interior cell.
static CELL_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|\s*|\t+| {2,}").expect("valid regex"));

/// Splits one text line into trimmed cells.
///
/// Leading and trailing empty cells are artifacts of boxed layouts such as
/// `| a | b |` and are dropped; interior empty cells keep their position so
/// column indices stay aligned with the header.
pub(crate) fn split_cells(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = CELL_SEPARATOR_RE
        .split(line)
        .map(|cell| cell.trim().to_owned())
        .collect();
    while cells.first().is_some_and(String::is_empty) {
        cells.remove(0);
    }
    while cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    cells
}

/// Groups consecutive multi-cell lines into grids.
///
/// Blank lines and single-cell prose lines terminate the current grid, so
/// tables separated by narrative text or vertical whitespace stay apart.
pub(crate) fn grids_from_page(text: &str) -> Vec<Grid> {
    let mut grids = Vec::new();
    let mut current: Grid = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            current.push(cells);
        } else if !current.is_empty() {
            grids.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        grids.push(current);
    }
    grids
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
