mod report;
mod workbook_file;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sheetpack_core::{PackConfig, PackageWriter};
use std::fs;
use std::path::{Path, PathBuf};
use workbook_file::WorkbookFile;

#[derive(Parser)]
#[command(name = "sheetpack")]
#[command(about = "Build an XLSX package from a TOML workbook description", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the workbook description (TOML)
    #[arg(value_name = "WORKBOOK")]
    workbook: PathBuf,

    /// Output .xlsx file
    #[arg(short, long)]
    output: PathBuf,

    /// Packaging configuration (TOML)
    #[arg(short, long, value_name = "PACK")]
    config: Option<PathBuf>,

    /// List the parts that would be written without writing them
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PackConfig::from_file(path)?,
        None => PackConfig::default(),
    };

    let description = WorkbookFile::from_file(&cli.workbook)?;
    let base_dir = cli.workbook.parent().unwrap_or(Path::new("."));
    let doc = description
        .to_document(base_dir)
        .with_context(|| format!("Failed to build workbook from '{}'", cli.workbook.display()))?;

    let parts = doc.to_parts(&config).context("Failed to assemble workbook")?;
    let mut report = report::PackReport::new(&cli.output, doc.sheets().len(), &parts);

    if !cli.dry_run {
        let bytes = PackageWriter::new(&config.package).to_bytes(&parts)?;
        fs::write(&cli.output, &bytes)
            .with_context(|| format!("Failed to write '{}'", cli.output.display()))?;
        report.written = true;
        report.archive_bytes = Some(bytes.len() as u64);
    }

    match cli.format {
        OutputFormat::Human => report::print_human(&report),
        OutputFormat::Json => report::print_json(&report)?,
    }

    Ok(())
}
