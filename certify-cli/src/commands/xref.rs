//! `certify xref` — names whose identifier is absent from a reference workbook.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use certify_xref::{find_missing, XrefOptions};

#[derive(Args, Debug)]
pub struct XrefArgs {
    /// Workbook whose id column defines the known identifiers.
    pub reference: PathBuf,

    /// Workbook whose rows are checked against the reference.
    pub candidate: PathBuf,

    /// Column holding identifiers in both workbooks.
    #[arg(long, default_value = "E")]
    pub id_column: String,

    /// Column holding the name reported for a missing identifier.
    #[arg(long, default_value = "D")]
    pub name_column: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl XrefArgs {
    pub fn run(self) -> Result<()> {
        let options = XrefOptions::from_letters(&self.id_column, &self.name_column)?;
        let missing = find_missing(&self.reference, &self.candidate, &options).with_context(|| {
            format!(
                "failed to compare {} against {}",
                self.candidate.display(),
                self.reference.display()
            )
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&missing).context("failed to serialize results")?
            );
            return Ok(());
        }

        if missing.is_empty() {
            println!("{}", "Every identifier is present in the reference.".green());
            return Ok(());
        }
        println!("Names not present in {}:", self.reference.display());
        for entry in &missing {
            match &entry.name {
                Some(name) => println!("{name}"),
                None => println!("{}", format!("<row {} has no name>", entry.row).bright_black()),
            }
        }
        Ok(())
    }
}
