//! Identifier cross-reference between two workbooks.
//!
//! [`collect_reference_ids`] gathers every 10-digit number found anywhere in
//! one column of a reference workbook (header included). [`find_missing`]
//! then walks the data rows of a candidate workbook and reports each row whose
//! identifier cell is not in that set, together with its name cell.
//!
//! Columns are addressed by spreadsheet letter (`E`, `AA`), rows by absolute
//! sheet position, so the comparison does not depend on where the used range
//! of either sheet starts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use calamine::{open_workbook_auto, Data, Range, Reader};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use certify_core::{roster::convert_cell, CellValue};

/// A run of ten digits, the identifier format.
pub const ID_PATTERN: &str = r"\d{10}";

static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(ID_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors from reading either workbook.
#[derive(Debug, Error)]
pub enum XrefError {
    #[error("workbook not found at {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read workbook at {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook at {path} has no worksheet")]
    NoWorksheet { path: PathBuf },

    #[error("invalid column '{0}': expected letters such as E or AA")]
    InvalidColumn(String),
}

/// Which columns hold the identifier and the name. Zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefOptions {
    pub id_column: u32,
    pub name_column: u32,
}

impl Default for XrefOptions {
    /// Identifier in column E, name in column D.
    fn default() -> Self {
        Self {
            id_column: 4,
            name_column: 3,
        }
    }
}

impl XrefOptions {
    /// Options from column letters, e.g. `("E", "D")`.
    pub fn from_letters(id_column: &str, name_column: &str) -> Result<Self, XrefError> {
        Ok(Self {
            id_column: column_index(id_column)?,
            name_column: column_index(name_column)?,
        })
    }
}

/// A candidate row whose identifier is absent from the reference workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEntry {
    /// 1-based sheet row.
    pub row: u32,
    pub name: Option<String>,
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Zero-based index of a column letter: `A` → 0, `Z` → 25, `AA` → 26.
pub fn column_index(letters: &str) -> Result<u32, XrefError> {
    let trimmed = letters.trim();
    if trimmed.is_empty() || trimmed.len() > 3 {
        return Err(XrefError::InvalidColumn(letters.to_string()));
    }
    let mut index: u32 = 0;
    for c in trimmed.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(XrefError::InvalidColumn(letters.to_string()));
        }
        index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    Ok(index - 1)
}

/// Every 10-digit run in `text`, leftmost first, non-overlapping.
pub fn extract_ids(text: &str) -> impl Iterator<Item = &str> {
    ID_RE.find_iter(text).map(|m| m.as_str())
}

/// Identifiers found in `column` of the reference workbook's first sheet.
pub fn collect_reference_ids(path: &Path, column: u32) -> Result<BTreeSet<String>, XrefError> {
    let range = first_sheet(path)?;
    let mut ids = BTreeSet::new();
    for row in sheet_rows(&range, 0) {
        if let Some(text) = cell(&range, row, column).as_text() {
            ids.extend(extract_ids(&text).map(str::to_string));
        }
    }
    tracing::debug!(path = %path.display(), ids = ids.len(), "collected reference identifiers");
    Ok(ids)
}

/// Candidate rows (after the header) whose identifier is not in `reference`.
///
/// Integral numeric cells compare by their digits, so `5551234567` stored as
/// a number matches the text `5551234567`. Fully blank rows are skipped.
pub fn find_missing(
    reference: &Path,
    candidate: &Path,
    options: &XrefOptions,
) -> Result<Vec<MissingEntry>, XrefError> {
    let known = collect_reference_ids(reference, options.id_column)?;
    let range = first_sheet(candidate)?;

    let mut missing = Vec::new();
    for row in sheet_rows(&range, 1) {
        let id = cell(&range, row, options.id_column).as_text();
        let name = cell(&range, row, options.name_column).as_text();
        if id.is_none() && name.is_none() {
            continue;
        }
        if id.as_deref().is_some_and(|id| known.contains(id)) {
            continue;
        }
        missing.push(MissingEntry {
            row: row + 1,
            name,
            id,
        });
    }
    tracing::info!(
        reference = %reference.display(),
        candidate = %candidate.display(),
        missing = missing.len(),
        "cross-reference complete"
    );
    Ok(missing)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn first_sheet(path: &Path) -> Result<Range<Data>, XrefError> {
    if !path.exists() {
        return Err(XrefError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let workbook_err = |source| XrefError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| XrefError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(workbook_err)
}

/// Absolute zero-based row indexes of the used range, from `min_row` on.
fn sheet_rows(range: &Range<Data>, min_row: u32) -> std::ops::RangeInclusive<u32> {
    match (range.start(), range.end()) {
        (Some((first, _)), Some((last, _))) => first.max(min_row)..=last,
        #[allow(clippy::reversed_empty_ranges)]
        _ => 1..=0,
    }
}

fn cell(range: &Range<Data>, row: u32, column: u32) -> CellValue {
    range
        .get_value((row, column))
        .map(convert_cell)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
