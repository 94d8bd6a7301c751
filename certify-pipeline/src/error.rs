//! Error types for certify-pipeline.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use certify_core::{ConfigError, RosterError};
use certify_renderer::{MergeError, RenderError};

/// Notification delivery failures.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport-level failure (connection, TLS, authentication).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The sender or recipient address could not be parsed.
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("email build error: {0}")]
    Build(String),

    /// SMTP settings are missing or malformed.
    #[error("SMTP configuration error: {0}")]
    Config(String),

    /// The attachment could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a per-record failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Format,
    Render,
    MissingTemplate,
    Merge,
    Notification,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Format => "format",
            ErrorKind::Render => "render",
            ErrorKind::MissingTemplate => "missing template",
            ErrorKind::Merge => "merge",
            ErrorKind::Notification => "notification",
            ErrorKind::Io => "io",
        };
        f.write_str(s)
    }
}

/// A failure confined to one roster record. The batch continues.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),

    /// The certificate was written but could not be delivered.
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::Render(RenderError::Format(_)) => ErrorKind::Format,
            RecordError::Render(RenderError::Io { .. }) => ErrorKind::Io,
            RecordError::Render(_) => ErrorKind::Render,
            RecordError::Merge(e) if e.is_template_problem() => ErrorKind::MissingTemplate,
            RecordError::Merge(MergeError::Io { .. }) => ErrorKind::Io,
            RecordError::Merge(_) => ErrorKind::Merge,
            RecordError::Notify(_) => ErrorKind::Notification,
            RecordError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Failures that stop the whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The template failed its preflight check before any record ran.
    #[error("template unusable: {0}")]
    Template(#[source] MergeError),

    #[error("layout error: {0}")]
    Layout(#[from] RenderError),

    /// The roster was processed but the identifier export failed.
    #[error("export failed: {0}")]
    Export(#[source] RosterError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn record_io(path: impl Into<PathBuf>, source: std::io::Error) -> RecordError {
    RecordError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn batch_io(path: impl Into<PathBuf>, source: std::io::Error) -> BatchError {
    BatchError::Io {
        path: path.into(),
        source,
    }
}
