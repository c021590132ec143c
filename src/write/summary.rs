// src/write/summary.rs

use anyhow::{Context, Result};
use serde::Serialize;
use std::{io::Write, path::Path};
use tracing::info;

use super::{replace_file, write_records_csv};
use crate::aggregate::{RunSummary, VintageRecord, VintageStatus};

/// Flat, CSV-friendly view of a [`VintageRecord`].
#[derive(Debug, Serialize)]
struct ManifestRow<'a> {
    year: i32,
    month_label: &'a str,
    text_file: &'a str,
    spreadsheet_file: Option<&'a str>,
    report_date: Option<&'a str>,
    commodity_label: Option<&'a str>,
    rows: usize,
    status: VintageStatus,
    issues: String,
}

impl<'a> From<&'a VintageRecord> for ManifestRow<'a> {
    fn from(r: &'a VintageRecord) -> Self {
        ManifestRow {
            year: r.year,
            month_label: &r.month_label,
            text_file: &r.text_file,
            spreadsheet_file: r.spreadsheet_file.as_deref(),
            report_date: r.report_date.as_deref(),
            commodity_label: r.commodity_label.as_deref(),
            rows: r.rows,
            status: r.status,
            issues: r.issues.join("; "),
        }
    }
}

/// One CSV line per vintage: files, report date, commodity headline, row
/// count, status and issues.
pub fn write_manifest_csv(summary: &RunSummary, path: &Path) -> Result<usize> {
    let rows: Vec<ManifestRow<'_>> = summary.vintages.iter().map(ManifestRow::from).collect();
    let n = write_records_csv(path, &rows)?;
    info!(vintages = n, path = %path.display(), "wrote vintage manifest");
    Ok(n)
}

/// Pretty-printed JSON with a trailing newline.
pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<()> {
    replace_file(path, |out| {
        serde_json::to_writer_pretty(&mut *out, summary).context("serializing run summary")?;
        out.write_all(b"\n")?;
        Ok(())
    })?;
    info!(path = %path.display(), "wrote run summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn summary() -> RunSummary {
        RunSummary {
            commodity: "Wheat".into(),
            missing_years: vec![2018],
            vintages: vec![
                VintageRecord {
                    year: 2019,
                    month_label: "Jan".into(),
                    text_file: "2019/wasde0119.txt".into(),
                    spreadsheet_file: Some("2019/wasde0119.xls".into()),
                    report_date: Some("January 2019".into()),
                    commodity_label: Some("Wheat".into()),
                    rows: 4,
                    status: VintageStatus::Extracted,
                    issues: vec![],
                },
                VintageRecord {
                    year: 2019,
                    month_label: "Feb".into(),
                    text_file: "2019/wasde0219.txt".into(),
                    spreadsheet_file: None,
                    report_date: None,
                    commodity_label: None,
                    rows: 0,
                    status: VintageStatus::Failed,
                    issues: vec!["a".into(), "b".into()],
                },
            ],
            rows: 4,
        }
    }

    #[test]
    fn manifest_has_one_line_per_vintage() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("manifest.csv");
        assert_eq!(write_manifest_csv(&summary(), &path)?, 2);
        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "year,month_label,text_file,spreadsheet_file,report_date,commodity_label,rows,status,issues"
        );
        assert_eq!(lines[2], "2019,Feb,2019/wasde0219.txt,,,,0,failed,a; b");
        Ok(())
    }

    #[test]
    fn summary_json_is_complete() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("summary.json");
        write_summary_json(&summary(), &path)?;
        let text = fs::read_to_string(&path)?;
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["missing_years"][0], 2018);
        assert_eq!(value["vintages"][1]["status"], "failed");
        assert_eq!(value["rows"], 4);
        Ok(())
    }
}
