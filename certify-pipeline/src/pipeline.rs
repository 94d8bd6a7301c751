//! Batch orchestration: one certificate per roster record.
//!
//! ## Per-record protocol
//!
//! 1. Build the render context and check the layout's required fields.
//! 2. Render the overlay to `<output_dir>/.<trace_id>.overlay.pdf`.
//! 3. Merge it onto the template as `<output_dir>/<prefix>_<Full_Name>.pdf`,
//!    or `<prefix>_<Full_Name>_row<N>.pdf` when an earlier record in the batch
//!    already claimed that name.
//! 4. Delete the transient overlay.
//! 5. Email the certificate when a notifier is attached and the record has an address.
//!
//! A failing step ends that record only. Identifiers are assigned to every
//! record before step 1 runs for the first one, and the roster is exported
//! with them once the loop finishes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Serialize, Serializer};

use certify_core::{
    roster,
    types::{ColumnMap, Field, Roster, RosterRecord, TraceId},
};
use certify_renderer::{DocumentMerger, LayoutSpec, OverlayRenderer, RenderContext};

use crate::error::{batch_io, record_io, BatchError, ErrorKind, RecordError};
use crate::naming::{output_file_name, prefix_for, row_file_name};
use crate::notify::{Notification, Notifier};

// ---------------------------------------------------------------------------
// Options & report
// ---------------------------------------------------------------------------

/// Where a batch writes and how it reads records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    /// Directory receiving `output_with_guids<timestamp>.xlsx`.
    pub export_dir: PathBuf,
    pub columns: ColumnMap,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            export_dir: PathBuf::from("."),
            columns: ColumnMap::default(),
        }
    }
}

/// What happened to one record.
#[derive(Debug, Serialize)]
pub struct RecordOutcome {
    pub row: usize,
    pub name: String,
    pub trace_id: TraceId,
    /// The merged certificate, when one was written.
    pub output: Option<PathBuf>,
    /// Recipient, when the certificate was emailed.
    pub emailed_to: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<RecordError>,
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Serialize)]
struct ErrorSummary {
    kind: ErrorKind,
    message: String,
}

fn serialize_error<S: Serializer>(error: &Option<RecordError>, s: S) -> Result<S::Ok, S::Error> {
    error
        .as_ref()
        .map(|e| ErrorSummary {
            kind: e.kind(),
            message: e.to_string(),
        })
        .serialize(s)
}

/// Result of a completed batch.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
    /// The roster export carrying every identifier.
    pub export: PathBuf,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Records with a certificate on disk (including failed notifications).
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.output.is_some()).count()
    }

    pub fn emailed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.emailed_to.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Identifiers in roster order.
    pub fn ids(&self) -> Vec<TraceId> {
        self.outcomes.iter().map(|o| o.trace_id).collect()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A configured batch: one layout, one template, optional notifier.
pub struct Pipeline<'n> {
    renderer: OverlayRenderer,
    merger: DocumentMerger,
    options: BatchOptions,
    notifier: Option<Box<dyn Notifier + 'n>>,
}

impl<'n> Pipeline<'n> {
    pub fn new(
        layout: LayoutSpec,
        template: impl Into<PathBuf>,
        options: BatchOptions,
    ) -> Result<Self, BatchError> {
        Ok(Self {
            renderer: OverlayRenderer::new(layout)?,
            merger: DocumentMerger::new(template),
            options,
            notifier: None,
        })
    }

    /// Email each certificate through `notifier` after it is written.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'n) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Fail fast on an unusable template or output directory.
    pub fn preflight(&self) -> Result<(), BatchError> {
        self.merger.load_template().map_err(BatchError::Template)?;
        let dir = &self.options.output_dir;
        std::fs::create_dir_all(dir).map_err(|e| batch_io(dir, e))?;
        Ok(())
    }

    /// Process every record, then export the roster with identifiers.
    pub fn run(&self, roster: &Roster) -> Result<BatchReport, BatchError> {
        self.preflight()?;

        let ids: Vec<TraceId> = roster.records.iter().map(|_| TraceId::generate()).collect();
        tracing::info!(
            records = roster.len(),
            layout = %self.renderer.layout().name,
            "starting batch"
        );

        let mut claimed: HashSet<String> = HashSet::new();
        let outcomes: Vec<RecordOutcome> = roster
            .records
            .iter()
            .zip(&ids)
            .map(|(record, id)| self.process(record, *id, &mut claimed))
            .collect();

        let export = roster::export_path(&self.options.export_dir, Utc::now());
        roster::export_with_ids(roster, &ids, &export).map_err(BatchError::Export)?;
        tracing::info!(path = %export.display(), "exported roster with identifiers");

        let report = BatchReport { outcomes, export };
        tracing::info!(
            total = report.total(),
            written = report.written(),
            emailed = report.emailed(),
            failed = report.failed(),
            "batch finished"
        );
        Ok(report)
    }

    /// Run one record through every step. Never fails the batch.
    ///
    /// `claimed` holds the output names already used in this batch.
    pub fn process(
        &self,
        record: &RosterRecord,
        trace_id: TraceId,
        claimed: &mut HashSet<String>,
    ) -> RecordOutcome {
        let columns = &self.options.columns;
        let mut outcome = RecordOutcome {
            row: record.row,
            name: record.display_name(columns),
            trace_id,
            output: None,
            emailed_to: None,
            error: None,
        };

        let result = self.write_certificate(record, trace_id, claimed).and_then(|(ctx, path)| {
            outcome.output = Some(path.clone());
            self.notify(&ctx, &path)
        });
        match result {
            Ok(recipient) => outcome.emailed_to = recipient,
            Err(error) => {
                tracing::error!(
                    row = record.row,
                    name = %outcome.name,
                    trace_id = %trace_id,
                    kind = %error.kind(),
                    error = %error,
                    "record failed"
                );
                outcome.error = Some(error);
            }
        }
        outcome
    }

    /// Render, merge and clean up; returns the context and output path.
    fn write_certificate(
        &self,
        record: &RosterRecord,
        trace_id: TraceId,
        claimed: &mut HashSet<String>,
    ) -> Result<(RenderContext, PathBuf), RecordError> {
        let columns = &self.options.columns;
        let ctx = self.renderer.context(record, columns, trace_id)?;

        let prefix = prefix_for(record, columns, self.renderer.layout());
        let mut file_name = output_file_name(&prefix, &ctx.full_name);
        if !claimed.insert(file_name.to_lowercase()) {
            let renamed = row_file_name(&prefix, &ctx.full_name, record.row);
            tracing::warn!(
                row = record.row,
                taken = %file_name,
                renamed = %renamed,
                "output name already used in this batch"
            );
            claimed.insert(renamed.to_lowercase());
            file_name = renamed;
        }
        let output = self.options.output_dir.join(file_name);
        let overlay = overlay_path(&self.options.output_dir, trace_id);

        self.renderer.render_to_file(&ctx, &overlay)?;
        self.merger.merge(&overlay, &output)?;
        std::fs::remove_file(&overlay).map_err(|e| record_io(&overlay, e))?;

        tracing::info!(row = record.row, path = %output.display(), "wrote certificate");
        Ok((ctx, output))
    }

    fn notify(&self, ctx: &RenderContext, output: &Path) -> Result<Option<String>, RecordError> {
        let Some(notifier) = &self.notifier else {
            return Ok(None);
        };
        if !ctx.has(Field::Email) {
            tracing::debug!(name = %ctx.full_name, "no email address; skipping notification");
            return Ok(None);
        }
        let (subject, body) = self.renderer.message(ctx)?;
        let notification = Notification {
            to: ctx.email.clone(),
            subject,
            body,
            attachment: output.to_path_buf(),
        };
        notifier.send(&notification)?;
        Ok(Some(notification.to))
    }
}

/// Transient overlay location for one record.
fn overlay_path(output_dir: &Path, trace_id: TraceId) -> PathBuf {
    output_dir.join(format!(".{trace_id}.overlay.pdf"))
}
