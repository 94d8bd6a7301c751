//! Certify core library — roster domain types, spreadsheet IO, dates, job config.
//!
//! - [`types`] — newtypes, cell values, roster records
//! - [`dates`] — date cell parsing and human-readable ranges
//! - [`roster`] — load a roster workbook / export it with identifiers
//! - [`config`] — YAML job configuration
//! - [`error`] — [`RosterError`], [`FormatError`], [`ConfigError`]

pub mod config;
pub mod dates;
pub mod error;
pub mod roster;
pub mod types;

pub use config::JobConfig;
pub use error::{ConfigError, FormatError, RosterError};
pub use types::{CellValue, ColumnMap, Field, Roster, RosterRecord, TraceId};
