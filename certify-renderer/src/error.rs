//! Error types for certify-renderer.

use std::path::PathBuf;

use thiserror::Error;

use certify_core::{types::Field, FormatError};

/// Failures producing an overlay for one record.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A field the layout depends on is empty or absent.
    #[error("record is missing required field: {field}")]
    MissingField { field: Field },

    /// A date cell could not be interpreted.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Tera template engine error (line content or message rules).
    #[error("template engine error: {0}")]
    Template(#[from] tera::Error),

    /// PDF object or content-stream encoding error.
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// A custom layout file could not be parsed.
    #[error("failed to parse layout at {path}: {source}")]
    LayoutParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Filesystem error while reading a layout or writing an overlay.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures compositing an overlay onto a template.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The template file does not exist.
    #[error("template not found at {path}")]
    MissingTemplate { path: PathBuf },

    /// The template exists but is not a readable PDF.
    #[error("template at {path} is not a readable PDF: {source}")]
    UnreadableTemplate {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    /// The template parsed but has no pages.
    #[error("template has no pages")]
    EmptyTemplate,

    /// The overlay is unreadable or does not have exactly one page.
    #[error("malformed overlay: {reason}")]
    MalformedOverlay { reason: String },

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    /// `true` when the template itself is the problem (missing, unreadable, empty).
    pub fn is_template_problem(&self) -> bool {
        matches!(
            self,
            MergeError::MissingTemplate { .. }
                | MergeError::UnreadableTemplate { .. }
                | MergeError::EmptyTemplate
        )
    }
}

pub(crate) fn render_io(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn merge_io(path: impl Into<PathBuf>, source: std::io::Error) -> MergeError {
    MergeError::Io {
        path: path.into(),
        source,
    }
}
