//! # certify-pipeline
//!
//! Sequential certificate batches: render, merge, email, export.
//!
//! Build a [`Pipeline`] from a layout and template, optionally attach a
//! [`Notifier`], then call [`Pipeline::run`] with a loaded roster.

pub mod error;
pub mod naming;
pub mod notify;
pub mod pipeline;

pub use error::{BatchError, ErrorKind, NotifyError, RecordError};
pub use naming::output_file_name;
pub use notify::{Notification, Notifier, SmtpConfig, SmtpNotifier};
pub use pipeline::{BatchOptions, BatchReport, Pipeline, RecordOutcome};
