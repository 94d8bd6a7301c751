//! `certify generate` — run a certificate batch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use certify_core::{roster, JobConfig};
use certify_pipeline::{BatchOptions, BatchReport, Pipeline, SmtpConfig, SmtpNotifier};

use super::resolve_layout;

/// Arguments for `certify generate`. Flags override the job file.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// YAML job file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Roster workbook (.xlsx, .xls, .ods).
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Template PDF; only its first page is used.
    #[arg(long)]
    pub template: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for the roster export with identifiers.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Built-in layout: wide-landscape, narrow-landscape, portrait-badge.
    #[arg(long, conflicts_with = "layout_file")]
    pub layout: Option<String>,

    /// Custom layout YAML.
    #[arg(long)]
    pub layout_file: Option<PathBuf>,

    /// Write certificates without emailing them.
    #[arg(long)]
    pub no_email: bool,

    /// Emit the batch report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn run(self) -> Result<()> {
        let config = self.job_config()?;
        let roster_path = config
            .roster
            .as_deref()
            .context("no roster given; pass --roster or set `roster` in the job file")?;
        let template = config
            .template
            .clone()
            .context("no template given; pass --template or set `template` in the job file")?;
        let layout = resolve_layout(config.layout.as_deref(), config.layout_file.as_deref())?;

        let roster = roster::load(roster_path, &config.columns.full_name)
            .with_context(|| format!("failed to load roster {}", roster_path.display()))?;

        let options = BatchOptions {
            output_dir: config.output_dir.clone(),
            export_dir: config.export_dir.clone(),
            columns: config.columns.clone(),
        };
        let mut pipeline = Pipeline::new(layout, template, options)?;
        if config.notify {
            let smtp = SmtpConfig::from_env()
                .context("email is enabled but SMTP settings are incomplete (use --no-email to skip)")?;
            let notifier = SmtpNotifier::new(&smtp).context("failed to set up SMTP transport")?;
            pipeline = pipeline.with_notifier(notifier);
        } else {
            tracing::info!("email disabled; certificates are written only");
        }

        let report = pipeline.run(&roster).context("certificate batch failed")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize batch report")?
            );
        } else {
            print_report(&report);
        }
        Ok(())
    }

    /// Job file (or defaults) with command-line overrides applied.
    fn job_config(&self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => JobConfig::load(path)
                .with_context(|| format!("failed to load job file {}", path.display()))?,
            None => JobConfig::default(),
        };
        if let Some(roster) = &self.roster {
            config.roster = Some(roster.clone());
        }
        if let Some(template) = &self.template {
            config.template = Some(template.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = dir.clone();
        }
        if let Some(layout) = &self.layout {
            config.layout = Some(layout.clone());
            config.layout_file = None;
        }
        if let Some(file) = &self.layout_file {
            config.layout_file = Some(file.clone());
            config.layout = None;
        }
        if self.no_email {
            config.notify = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "row")]
    row: usize,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_report(report: &BatchReport) {
    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|o| {
            let (status, detail) = match (&o.error, &o.output) {
                (Some(e), _) => (format!("{} ({})", "FAILED".red(), e.kind()), e.to_string()),
                (None, Some(path)) => {
                    let file = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    match &o.emailed_to {
                        Some(to) => ("EMAILED".green().to_string(), format!("{file} -> {to}")),
                        None => ("WRITTEN".green().to_string(), file),
                    }
                }
                (None, None) => (String::new(), String::new()),
            };
            OutcomeRow {
                row: o.row,
                name: o.name.clone(),
                status,
                detail,
            }
        })
        .collect();

    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
    println!(
        "{} records | {} written | {} emailed | {} failed",
        report.total(),
        report.written(),
        report.emailed(),
        report.failed(),
    );
    println!("Identifiers exported to {}", report.export.display());
}
