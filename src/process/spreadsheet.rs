// src/process/spreadsheet.rs

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::error::ExtractError;

/// Absolute (row, column) position of a worksheet cell, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl Default for CellRef {
    fn default() -> Self {
        CellRef { row: 0, col: 0 }
    }
}

/// Where in the companion spreadsheet to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// Sheet holding the report date label.
    pub date_sheet: usize,
    pub date_cell: CellRef,
    /// Sheet whose first column lists the commodity headline rows.
    pub commodity_sheet: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            date_sheet: 1,
            date_cell: CellRef::default(),
            commodity_sheet: 0,
        }
    }
}

/// What could be recovered from one spreadsheet. Missing pieces are `None`
/// and described in `issues`.
#[derive(Debug, Default)]
pub struct SheetInfo {
    pub report_date: Option<String>,
    pub commodity_label: Option<String>,
    pub issues: Vec<ExtractError>,
}

/// Render a cell as text; empty cells and blank strings are `None`.
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => ndt.format("%Y-%m-%d").to_string(),
            None => dt.as_f64().to_string(),
        },
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// The report date label at `cell`, if the cell exists and is not blank.
pub fn date_label(range: &Range<Data>, cell: CellRef) -> Option<String> {
    range.get_value((cell.row, cell.col)).and_then(cell_text)
}

/// First cell of column 0 whose text starts with `commodity`, ignoring case.
pub fn commodity_row_label(range: &Range<Data>, commodity: &str) -> Option<String> {
    let (first_row, _) = range.start()?;
    let (last_row, _) = range.end()?;
    let wanted = commodity.to_lowercase();
    (first_row..=last_row).find_map(|row| {
        range
            .get_value((row, 0))
            .and_then(cell_text)
            .filter(|text| text.to_lowercase().starts_with(&wanted))
    })
}

/// Open the spreadsheet and recover the report date and commodity headline.
///
/// Never fails the vintage: an unreadable workbook, a missing sheet or a
/// blank cell each become an entry in [`SheetInfo::issues`].
#[instrument(level = "debug", skip(layout), fields(path = %path.display()))]
pub fn read_sheet_info(path: &Path, layout: &SheetLayout, commodity: &str) -> SheetInfo {
    let mut info = SheetInfo::default();

    let mut workbook = match open_workbook_auto(path) {
        Ok(wb) => wb,
        Err(e) => {
            warn!(error = %e, "cannot open spreadsheet");
            info.issues.push(ExtractError::SpreadsheetUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            return info;
        }
    };

    match workbook.worksheet_range_at(layout.date_sheet) {
        Some(Ok(range)) => {
            info.report_date = date_label(&range, layout.date_cell);
            if info.report_date.is_none() {
                info.issues.push(ExtractError::SpreadsheetCellMissing {
                    path: path.to_path_buf(),
                    what: format!(
                        "date cell ({}, {}) on sheet {}",
                        layout.date_cell.row, layout.date_cell.col, layout.date_sheet
                    ),
                });
            }
        }
        Some(Err(e)) => info.issues.push(ExtractError::SpreadsheetUnreadable {
            path: path.to_path_buf(),
            reason: format!("sheet {}: {}", layout.date_sheet, e),
        }),
        None => info.issues.push(ExtractError::SpreadsheetCellMissing {
            path: path.to_path_buf(),
            what: format!("sheet {}", layout.date_sheet),
        }),
    }

    match workbook.worksheet_range_at(layout.commodity_sheet) {
        Some(Ok(range)) => {
            info.commodity_label = commodity_row_label(&range, commodity);
            if info.commodity_label.is_none() {
                info.issues.push(ExtractError::SpreadsheetCellMissing {
                    path: path.to_path_buf(),
                    what: format!("`{}` row on sheet {}", commodity, layout.commodity_sheet),
                });
            }
        }
        Some(Err(e)) => info.issues.push(ExtractError::SpreadsheetUnreadable {
            path: path.to_path_buf(),
            reason: format!("sheet {}: {}", layout.commodity_sheet, e),
        }),
        None => info.issues.push(ExtractError::SpreadsheetCellMissing {
            path: path.to_path_buf(),
            what: format!("sheet {}", layout.commodity_sheet),
        }),
    }

    debug!(
        report_date = ?info.report_date,
        commodity_label = ?info.commodity_label,
        issues = info.issues.len(),
        "spreadsheet read"
    );
    info
}
