//! Error types for certify-core.

use std::path::PathBuf;

use thiserror::Error;

/// A cell that should hold a calendar date holds something else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("column '{column}' value '{value}' is not a recognized date")]
    UnparseableDate { column: String, value: String },
}

/// Failures reading or exporting a roster workbook.
///
/// All of these are batch-level: nothing can be processed without a roster.
#[derive(Debug, Error)]
pub enum RosterError {
    /// The roster file did not exist at the expected path.
    #[error("roster not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// calamine could not open or decode the workbook.
    #[error("failed to read workbook at {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// The workbook has no worksheet to read.
    #[error("workbook at {path} contains no worksheets")]
    NoWorksheet { path: PathBuf },

    /// A required header is absent from the first row.
    #[error("roster at {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    /// Identifier and record counts disagree on export.
    #[error("cannot export {records} records with {ids} identifiers")]
    IdentifierCount { records: usize, ids: usize },

    /// rust_xlsxwriter failed while writing the export.
    #[error("failed to write roster export: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

/// Failures loading the YAML job configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file did not exist.
    #[error("job config not found at {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse job config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config parsed but is unusable (e.g. two layouts selected).
    #[error("invalid job config: {0}")]
    Invalid(String),
}
