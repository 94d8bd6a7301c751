//! `certify layouts` — list built-in layouts.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use certify_renderer::layout::INCH;
use certify_renderer::LayoutVariant;

#[derive(Args, Debug)]
pub struct LayoutsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct LayoutRow {
    #[tabled(rename = "layout")]
    name: String,
    #[tabled(rename = "page (in)")]
    page: String,
    #[tabled(rename = "lines")]
    lines: usize,
    #[tabled(rename = "required fields")]
    required: String,
}

impl LayoutsArgs {
    pub fn run(self) -> Result<()> {
        let rows: Vec<LayoutRow> = LayoutVariant::all()
            .iter()
            .map(|variant| {
                let spec = variant.spec();
                LayoutRow {
                    name: variant.name().to_string(),
                    page: format!(
                        "{:.2} x {:.2}",
                        spec.page.width / INCH,
                        spec.page.height / INCH
                    ),
                    lines: spec.lines.len(),
                    required: spec
                        .required
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                }
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize layouts")?
            );
            return Ok(());
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
