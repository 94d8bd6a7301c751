//! Domain types for certificate rosters.
//!
//! Cell values are modelled independently of the spreadsheet library so the
//! renderer and pipeline never see calamine types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates;
use crate::error::FormatError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Traceability identifier stamped on one certificate and exported with the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(pub Uuid);

impl TraceId {
    /// A fresh random (v4) identifier. Never reproducible across runs.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for TraceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// `true` for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering of the cell, `None` when blank.
    ///
    /// Integral numbers print without a fractional part so numeric ids read
    /// back as `5551234567`, not `5551234567.0`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{n:.0}")),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Fields and column mapping
// ---------------------------------------------------------------------------

/// Logical roster fields a layout can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FullName,
    Specialization,
    Email,
    StartDate,
    EndDate,
    Weeks,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::FullName => write!(f, "full name"),
            Field::Specialization => write!(f, "specialization"),
            Field::Email => write!(f, "email"),
            Field::StartDate => write!(f, "start date"),
            Field::EndDate => write!(f, "end date"),
            Field::Weeks => write!(f, "number of weeks"),
        }
    }
}

/// Which header holds each logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub full_name: String,
    pub specialization: String,
    pub email: String,
    pub start_date: String,
    pub end_date: String,
    pub weeks: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            full_name: "Full Name".to_string(),
            specialization: "Specialization".to_string(),
            email: "Email".to_string(),
            start_date: "Start Date".to_string(),
            end_date: "End Date".to_string(),
            weeks: "Number Of Weeks".to_string(),
        }
    }
}

impl ColumnMap {
    /// Header name for `field`.
    pub fn column(&self, field: Field) -> &str {
        match field {
            Field::FullName => &self.full_name,
            Field::Specialization => &self.specialization,
            Field::Email => &self.email,
            Field::StartDate => &self.start_date,
            Field::EndDate => &self.end_date,
            Field::Weeks => &self.weeks,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One data row of the roster, keyed by header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RosterRecord {
    /// 1-based row number in the source sheet.
    pub row: usize,
    pub fields: BTreeMap<String, CellValue>,
}

impl RosterRecord {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests and previews.
    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.fields.insert(column.into(), value);
        self
    }

    /// Raw cell under `column`; [`CellValue::Empty`] when absent.
    pub fn get(&self, column: &str) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.fields.get(column).unwrap_or(EMPTY)
    }

    /// Non-blank text of a logical field.
    pub fn text(&self, columns: &ColumnMap, field: Field) -> Option<String> {
        self.get(columns.column(field)).as_text()
    }

    /// Calendar date of a logical field.
    ///
    /// `Ok(None)` when the cell is blank; [`FormatError`] when it holds
    /// something that is not a date.
    pub fn date(&self, columns: &ColumnMap, field: Field) -> Result<Option<NaiveDate>, FormatError> {
        let column = columns.column(field);
        let value = self.get(column);
        if value.is_blank() {
            return Ok(None);
        }
        dates::parse_date(column, value).map(Some)
    }

    /// Name used in logs; falls back to the row number.
    pub fn display_name(&self, columns: &ColumnMap) -> String {
        self.text(columns, Field::FullName)
            .unwrap_or_else(|| format!("<row {}>", self.row))
    }
}

/// An ordered roster as read from the source workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    pub source: PathBuf,
    /// Header row, in sheet order.
    pub headers: Vec<String>,
    pub records: Vec<RosterRecord>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
