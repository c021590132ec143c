// src/aggregate.rs

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ExtractError;
use crate::process::row::{BalanceRow, RecordType};
use crate::process::{ExtractedVintage, VintageOutcome};

/// Every extracted vintage, in locator order. Rows are never merged or
/// deduplicated across vintages.
#[derive(Debug, Default)]
pub struct ConsolidatedDataset {
    vintages: Vec<ExtractedVintage>,
}

impl ConsolidatedDataset {
    pub fn vintages(&self) -> &[ExtractedVintage] {
        &self.vintages
    }

    /// All rows, vintage by vintage, in file order.
    pub fn rows(&self) -> impl Iterator<Item = &BalanceRow> + '_ {
        self.vintages.iter().flat_map(|v| v.rows.iter())
    }

    /// Rows paired with the vintage that produced them.
    pub fn entries(&self) -> impl Iterator<Item = (&ExtractedVintage, &BalanceRow)> + '_ {
        self.vintages
            .iter()
            .flat_map(|v| v.rows.iter().map(move |r| (v, r)))
    }

    pub fn len(&self) -> usize {
        self.vintages.iter().map(|v| v.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VintageStatus {
    Extracted,
    Skipped,
    Failed,
}

/// Audit line for one vintage, whatever happened to it.
#[derive(Debug, Clone, Serialize)]
pub struct VintageRecord {
    pub year: i32,
    pub month_label: String,
    pub text_file: String,
    pub spreadsheet_file: Option<String>,
    pub report_date: Option<String>,
    pub commodity_label: Option<String>,
    pub rows: usize,
    pub status: VintageStatus,
    pub issues: Vec<String>,
}

/// Archive-completeness report for one run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub commodity: String,
    pub missing_years: Vec<i32>,
    pub vintages: Vec<VintageRecord>,
    pub rows: usize,
}

impl RunSummary {
    pub fn count(&self, status: VintageStatus) -> usize {
        self.vintages.iter().filter(|v| v.status == status).count()
    }

    /// Vintages that need a human look: anything not cleanly extracted.
    pub fn needs_attention(&self) -> impl Iterator<Item = &VintageRecord> {
        self.vintages
            .iter()
            .filter(|v| v.status != VintageStatus::Extracted || !v.issues.is_empty())
    }
}

/// Folds per-vintage outcomes, in order, into the dataset and its summary.
pub struct Aggregator {
    dataset: ConsolidatedDataset,
    summary: RunSummary,
}

impl Aggregator {
    pub fn new(commodity: &str, missing_years: &[ExtractError]) -> Self {
        let missing_years = missing_years
            .iter()
            .filter_map(|e| match e {
                ExtractError::MissingArchiveYear { year, .. } => Some(*year),
                _ => None,
            })
            .collect();
        Self {
            dataset: ConsolidatedDataset::default(),
            summary: RunSummary {
                commodity: commodity.to_string(),
                missing_years,
                ..RunSummary::default()
            },
        }
    }

    pub fn push(&mut self, outcome: VintageOutcome) {
        let v = outcome.vintage();
        let mut record = VintageRecord {
            year: v.year,
            month_label: v.month_label.clone(),
            text_file: v.text_path.display().to_string(),
            spreadsheet_file: v.spreadsheet_path.as_ref().map(|p| p.display().to_string()),
            report_date: None,
            commodity_label: None,
            rows: 0,
            status: VintageStatus::Extracted,
            issues: Vec::new(),
        };

        match outcome {
            VintageOutcome::Extracted(x) => {
                let data_rows = x
                    .rows
                    .iter()
                    .filter(|r| r.record_type == RecordType::Data)
                    .count();
                if data_rows != 1 {
                    warn!(path = %record.text_file, data_rows, "expected exactly one data row");
                }
                record.report_date = x.report_date.clone();
                record.commodity_label = x.commodity_label.clone();
                record.rows = x.rows.len();
                record
                    .issues
                    .extend(x.sheet_issues.iter().map(ExtractError::describe));
                record.issues.extend(x.flags.iter().map(|f| f.to_string()));
                self.summary.rows += x.rows.len();
                self.dataset.vintages.push(x);
            }
            VintageOutcome::Skipped { reason, .. } => {
                record.status = VintageStatus::Skipped;
                record.issues.push(reason.describe());
            }
            VintageOutcome::Failed { error, .. } => {
                record.status = VintageStatus::Failed;
                record.issues.push(error.describe());
            }
        }
        self.summary.vintages.push(record);
    }

    pub fn finish(self) -> (ConsolidatedDataset, RunSummary) {
        info!(
            vintages = self.summary.vintages.len(),
            extracted = self.summary.count(VintageStatus::Extracted),
            skipped = self.summary.count(VintageStatus::Skipped),
            failed = self.summary.count(VintageStatus::Failed),
            rows = self.summary.rows,
            "aggregated"
        );
        (self.dataset, self.summary)
    }
}
