//! Certify — certificate batch generation CLI.
//!
//! # Usage
//!
//! ```text
//! certify generate [--config job.yaml] [--roster F] [--template F] [--output-dir D]
//!                  [--export-dir D] [--layout V | --layout-file F] [--no-email] [--json]
//! certify preview --name <name> [--specialization S] [--start D --end D]
//!                 [--layout V] [--template F] --out <file>
//! certify layouts [--json]
//! certify xref <reference> <candidate> [--id-column E] [--name-column D] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{generate::GenerateArgs, layouts::LayoutsArgs, preview::PreviewArgs, xref::XrefArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "certify",
    version,
    about = "Generate personalized certificate PDFs from a spreadsheet roster",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render, merge and email a certificate for every roster record.
    Generate(GenerateArgs),

    /// Render a single certificate from command-line values.
    Preview(PreviewArgs),

    /// List the built-in layouts.
    Layouts(LayoutsArgs),

    /// Report names whose identifier is missing from a reference workbook.
    Xref(XrefArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // A missing .env is normal; SMTP settings may come from the shell.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => args.run(),
        Commands::Preview(args) => args.run(),
        Commands::Layouts(args) => args.run(),
        Commands::Xref(args) => args.run(),
    }
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
