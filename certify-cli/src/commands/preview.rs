//! `certify preview` — render one certificate from flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use certify_core::types::{CellValue, ColumnMap, RosterRecord, TraceId};
use certify_renderer::{DocumentMerger, OverlayRenderer};

use super::resolve_layout;

/// Arguments for `certify preview`. Nothing is emailed or exported.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub specialization: Option<String>,

    /// Start date, e.g. 2024-01-10.
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End date, e.g. 2024-03-20.
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    #[arg(long, conflicts_with = "layout_file")]
    pub layout: Option<String>,

    #[arg(long)]
    pub layout_file: Option<PathBuf>,

    /// Merge onto this template; without it only the overlay is written.
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Destination PDF.
    #[arg(long)]
    pub out: PathBuf,
}

impl PreviewArgs {
    pub fn run(self) -> Result<()> {
        let layout = resolve_layout(self.layout.as_deref(), self.layout_file.as_deref())?;
        let renderer = OverlayRenderer::new(layout)?;

        let columns = ColumnMap::default();
        let text = |value: &Option<String>| {
            value
                .as_ref()
                .map(|v| CellValue::Text(v.clone()))
                .unwrap_or_default()
        };
        let record = RosterRecord::new(1)
            .with(&columns.full_name, CellValue::Text(self.name.clone()))
            .with(&columns.specialization, text(&self.specialization))
            .with(&columns.start_date, text(&self.start))
            .with(&columns.end_date, text(&self.end));

        let trace_id = TraceId::generate();
        let ctx = renderer
            .context(&record, &columns, trace_id)
            .context("cannot render preview")?;

        match &self.template {
            Some(template) => {
                let overlay = renderer.render(&ctx)?;
                DocumentMerger::new(template)
                    .merge_document(overlay, &self.out)
                    .with_context(|| format!("failed to merge onto {}", template.display()))?;
            }
            None => renderer.render_to_file(&ctx, &self.out)?,
        }

        println!("Wrote {} (trace id {trace_id})", self.out.display());
        Ok(())
    }
}
