// src/process/mod.rs

pub mod block;
pub mod row;
pub mod spreadsheet;
pub mod utils;

use std::fs;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ExtractError;
use crate::locate::ReportVintage;
use block::{parse_bulletin, ShapeFlag};
use row::BalanceRow;
use spreadsheet::{read_sheet_info, SheetInfo, SheetLayout};

/// Per-run settings shared by every vintage's extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Commodity label exactly as the bulletin capitalises it, e.g. `Wheat`.
    pub commodity: String,
    pub layout: SheetLayout,
}

/// A vintage whose commodity block was found and fully parsed.
#[derive(Debug)]
pub struct ExtractedVintage {
    pub vintage: ReportVintage,
    pub report_date: Option<String>,
    pub commodity_label: Option<String>,
    /// Recovered spreadsheet problems; the rows are still good.
    pub sheet_issues: Vec<ExtractError>,
    pub lines_in_block: usize,
    pub flags: Vec<ShapeFlag>,
    pub rows: Vec<BalanceRow>,
}

#[derive(Debug)]
pub enum VintageOutcome {
    Extracted(ExtractedVintage),
    /// Soft failure: the vintage contributes no rows.
    Skipped {
        vintage: ReportVintage,
        reason: ExtractError,
    },
    /// Hard failure for this vintage only.
    Failed {
        vintage: ReportVintage,
        error: ExtractError,
    },
}

impl VintageOutcome {
    pub fn vintage(&self) -> &ReportVintage {
        match self {
            VintageOutcome::Extracted(x) => &x.vintage,
            VintageOutcome::Skipped { vintage, .. } | VintageOutcome::Failed { vintage, .. } => {
                vintage
            }
        }
    }
}

/// Extract one vintage: spreadsheet annotations plus the commodity block of
/// the text bulletin. Errors never escape; they are folded into the outcome.
#[instrument(level = "info", skip(vintage, opts), fields(path = %vintage.text_path.display()))]
pub fn extract_vintage(vintage: ReportVintage, opts: &ExtractOptions) -> VintageOutcome {
    let sheet = match &vintage.spreadsheet_path {
        Some(path) => read_sheet_info(path, &opts.layout, &opts.commodity),
        None => SheetInfo {
            issues: vec![ExtractError::SpreadsheetCellMissing {
                path: vintage.text_path.clone(),
                what: "companion spreadsheet".into(),
            }],
            ..SheetInfo::default()
        },
    };
    for issue in &sheet.issues {
        warn!(issue = %issue.describe(), "spreadsheet annotation missing");
    }

    // the bulletin is read whole and its handle dropped before parsing
    let text = match fs::read(&vintage.text_path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(source) => {
            let error = ExtractError::Io {
                path: vintage.text_path.clone(),
                source,
            };
            error!(error = %error.describe(), "bulletin unreadable");
            return VintageOutcome::Failed { vintage, error };
        }
    };

    let block = match parse_bulletin(&text, &opts.commodity) {
        Ok(Some(block)) => block,
        Ok(None) => {
            let reason = ExtractError::CommodityBlockNotFound {
                label: opts.commodity.clone(),
                path: vintage.text_path.clone(),
            };
            warn!("{}", reason);
            return VintageOutcome::Skipped { vintage, reason };
        }
        Err(source) => {
            let error = ExtractError::MalformedLine {
                path: vintage.text_path.clone(),
                source,
            };
            error!(error = %error.describe(), "vintage failed");
            return VintageOutcome::Failed { vintage, error };
        }
    };

    if block.rows.is_empty() {
        let reason = ExtractError::EmptyCommodityBlock {
            label: opts.commodity.clone(),
            path: vintage.text_path.clone(),
        };
        warn!("{}", reason);
        return VintageOutcome::Skipped { vintage, reason };
    }

    for flag in &block.flags {
        warn!(flag = %flag, "unexpected block shape");
    }
    debug!(
        report_date = ?sheet.report_date,
        commodity_label = ?sheet.commodity_label,
        "spreadsheet cross-check"
    );
    info!(
        rows = block.rows.len(),
        lines = block.lines_in_block,
        "extracted"
    );

    VintageOutcome::Extracted(ExtractedVintage {
        vintage,
        report_date: sheet.report_date,
        commodity_label: sheet.commodity_label,
        sheet_issues: sheet.issues,
        lines_in_block: block.lines_in_block,
        flags: block.flags,
        rows: block.rows,
    })
}
