//! Roster workbooks.
//!
//! # Layout
//!
//! The first worksheet is read. Its first row is the header; every later row
//! with at least one non-blank cell becomes a [`RosterRecord`]. Headers that
//! are blank are named `Unnamed: <index>` so their data survives an export.
//!
//! # Export
//!
//! [`export_with_ids`] writes the original headers plus [`GUID_COLUMN`], one
//! row per record, into a fresh `.xlsx`. A roster that already has a
//! [`GUID_COLUMN`] keeps its position, with the new identifiers in place of
//! the old ones. [`export_path`] derives the
//! timestamped file name.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook};

use crate::dates::{self, datetime_to_excel_serial};
use crate::error::RosterError;
use crate::types::{CellValue, Roster, RosterRecord, TraceId};

/// Header of the identifier column appended on export.
pub const GUID_COLUMN: &str = "GUID";

/// Number format used for date-time cells on export.
const EXPORT_DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Map a calamine cell onto [`CellValue`].
pub fn convert_cell(value: &Data) -> CellValue {
    match value {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        // `as_datetime` accounts for the workbook's 1900 or 1904 date system.
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => dates::parse_date_text(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Load the first worksheet of the workbook at `path`.
///
/// Returns `RosterError::NotFound` if absent and `RosterError::MissingColumn`
/// if `required_column` is not among the headers.
pub fn load(path: &Path, required_column: &str) -> Result<Roster, RosterError> {
    if !path.exists() {
        return Err(RosterError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let workbook_err = |source| RosterError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RosterError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(workbook_err)?;
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|cells| {
            cells
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let name = cell.to_string().trim().to_string();
                    if name.is_empty() {
                        format!("Unnamed: {idx}")
                    } else {
                        name
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if !headers.iter().any(|h| h == required_column) {
        return Err(RosterError::MissingColumn {
            path: path.to_path_buf(),
            column: required_column.to_string(),
        });
    }

    let mut records = Vec::new();
    for (offset, cells) in rows.enumerate() {
        // +1 for the header, +1 for 1-based numbering.
        let mut record = RosterRecord::new(first_row + offset + 2);
        for (header, cell) in headers.iter().zip(cells.iter()) {
            record.fields.insert(header.clone(), convert_cell(cell));
        }
        if record.fields.values().all(CellValue::is_blank) {
            tracing::debug!(row = record.row, "skipping blank roster row");
            continue;
        }
        records.push(record);
    }

    tracing::info!(path = %path.display(), records = records.len(), "loaded roster");
    Ok(Roster {
        source: path.to_path_buf(),
        headers,
        records,
    })
}

// ---------------------------------------------------------------------------
// 2. Export
// ---------------------------------------------------------------------------

/// `<dir>/output_with_guids<unix-seconds>.<micros>.xlsx`
pub fn export_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "output_with_guids{}.{:06}.xlsx",
        now.timestamp(),
        now.timestamp_subsec_micros()
    ))
}

/// Write `roster` plus one identifier per record to `path`.
///
/// `ids[i]` belongs to `roster.records[i]`.
pub fn export_with_ids(roster: &Roster, ids: &[TraceId], path: &Path) -> Result<(), RosterError> {
    if roster.records.len() != ids.len() {
        return Err(RosterError::IdentifierCount {
            records: roster.records.len(),
            ids: ids.len(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RosterError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(EXPORT_DATE_FORMAT);
    let sheet = workbook.add_worksheet();

    let guid_col = roster
        .headers
        .iter()
        .position(|h| h == GUID_COLUMN)
        .unwrap_or(roster.headers.len()) as u16;
    for (col, header) in roster.headers.iter().enumerate() {
        sheet.write_string(0, col as u16, header.as_str())?;
    }
    sheet.write_string(0, guid_col, GUID_COLUMN)?;

    for (idx, (record, id)) in roster.records.iter().zip(ids).enumerate() {
        let row = (idx + 1) as u32;
        for (col, header) in roster.headers.iter().enumerate() {
            let col = col as u16;
            if col == guid_col {
                continue;
            }
            match record.get(header) {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    sheet.write_string(row, col, s.as_str())?;
                }
                CellValue::Number(n) => {
                    sheet.write_number(row, col, *n)?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                CellValue::DateTime(dt) => {
                    sheet.write_number_with_format(
                        row,
                        col,
                        datetime_to_excel_serial(dt),
                        &date_format,
                    )?;
                }
            }
        }
        sheet.write_string(row, guid_col, id.to_string())?;
    }

    workbook.save(path)?;
    tracing::info!(path = %path.display(), rows = ids.len(), "exported roster");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
