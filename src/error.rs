// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// A bulletin line inside the commodity block that did not land on the
/// eight-position row layout after column insertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_no}: expected {expected} fields, found {found}: {line:?}")]
pub struct MalformedLine {
    /// 1-based line number within the bulletin.
    pub line_no: usize,
    pub expected: usize,
    pub found: usize,
    pub line: String,
}

/// Everything that can go wrong while extracting a single report vintage.
///
/// Only `MalformedLine` and `Io` on the bulletin itself fail a vintage;
/// the rest are recovered locally and reported in the run summary.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("archive year {year} missing at {path}")]
    MissingArchiveYear { year: i32, path: PathBuf },

    #[error("commodity block `{label}` not found in {path}")]
    CommodityBlockNotFound { label: String, path: PathBuf },

    #[error("commodity block `{label}` in {path} has no rows")]
    EmptyCommodityBlock { label: String, path: PathBuf },

    #[error("malformed line in {path}")]
    MalformedLine {
        path: PathBuf,
        #[source]
        source: MalformedLine,
    },

    #[error("spreadsheet {path}: {what} missing")]
    SpreadsheetCellMissing { path: PathBuf, what: String },

    #[error("spreadsheet {path} unreadable: {reason}")]
    SpreadsheetUnreadable { path: PathBuf, reason: String },

    #[error("reading {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// Full message including the source chain, for summaries and manifests.
    pub fn describe(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}
