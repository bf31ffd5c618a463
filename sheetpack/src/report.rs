//! Part listings for `--dry-run` and the post-write summary

use anyhow::Result;
use colored::*;
use serde::Serialize;
use sheetpack_core::PartMap;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct PackReport {
    pub output: String,
    pub written: bool,
    pub sheets: usize,
    pub parts: Vec<PartInfo>,
    /// Uncompressed payload size.
    pub total_bytes: u64,
    /// Archive size, once written.
    pub archive_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PartInfo {
    pub name: String,
    pub bytes: u64,
}

impl PackReport {
    pub fn new(output: &Path, sheets: usize, parts: &PartMap) -> Self {
        let parts: Vec<PartInfo> = parts
            .iter()
            .map(|(name, part)| PartInfo {
                name: name.to_string(),
                bytes: part.as_bytes().len() as u64,
            })
            .collect();
        let total_bytes = parts.iter().map(|p| p.bytes).sum();
        Self {
            output: output.display().to_string(),
            written: false,
            sheets,
            parts,
            total_bytes,
            archive_bytes: None,
        }
    }
}

pub fn print_human(report: &PackReport) {
    if report.written {
        println!("{}", format!("✓ Wrote {} sheet(s)", report.sheets).green().bold());
    } else {
        println!("{}", "[DRY RUN] Parts that would be written:".bold());
    }
    for part in &report.parts {
        println!("  {:<45} {:>12}", part.name.cyan(), humanize_size(part.bytes));
    }
    println!();
    println!("{} {}", "Payload:".bold(), humanize_size(report.total_bytes));
    if let Some(size) = report.archive_bytes {
        println!("{} {}", "Archive:".bold(), humanize_size(size));
    }
    let label = if report.written { "Output:" } else { "Output would be:" };
    println!("{} {}", label.bold(), report.output.yellow());
}

pub fn print_json(report: &PackReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

fn humanize_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetpack_core::Part;

    #[test]
    fn test_report_totals_and_json() -> Result<()> {
        let mut parts = PartMap::new();
        parts.insert("xl/workbook.xml", Part::Xml("<workbook/>".to_string()))?;
        parts.insert("xl/media/image1.png", Part::Binary(vec![0; 2048]))?;

        let report = PackReport::new(Path::new("out.xlsx"), 1, &parts);
        assert_eq!(report.total_bytes, 2048 + 11);
        assert_eq!(report.parts[0].name, "xl/media/image1.png");

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["output"], "out.xlsx");
        assert_eq!(json["parts"][1]["bytes"], 11);
        assert!(json["archive_bytes"].is_null());
        Ok(())
    }

    #[test]
    fn test_humanize_size() {
        assert_eq!(humanize_size(512), "512 bytes");
        assert_eq!(humanize_size(2048), "2.00 KB");
        assert_eq!(humanize_size(3 * 1024 * 1024), "3.00 MB");
    }
}
