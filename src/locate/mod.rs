// src/locate/mod.rs

use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use serde::Serialize;
use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::process::utils::month_label_from_filename;

/// One monthly bulletin release: its text file and, when the archive has
/// one, the companion spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportVintage {
    /// Archive year directory the files were found in.
    pub year: i32,
    /// Release-month label, e.g. `Feb`; the file stem when the name
    /// carries no month.
    pub month_label: String,
    pub text_path: PathBuf,
    pub spreadsheet_path: Option<PathBuf>,
}

/// Output of a locator pass.
#[derive(Debug, Default)]
pub struct Located {
    /// Sorted by year, then by text filename.
    pub vintages: Vec<ReportVintage>,
    /// Year directories absent from the archive.
    pub missing_years: Vec<ExtractError>,
}

/// File extensions that identify each half of a vintage.
#[derive(Debug, Clone)]
pub struct FileKinds<'a> {
    pub text: &'a [String],
    pub spreadsheet: &'a [String],
}

/// List files in `dir` with any of `extensions` (case-insensitive), sorted
/// by file name.
fn list_by_extension(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let opts = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let base = Pattern::escape(&dir.to_string_lossy());
    let mut out = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/*.{}", base, Pattern::escape(ext));
        for entry in glob_with(&pattern, opts)
            .with_context(|| format!("invalid glob pattern {}", pattern))?
        {
            match entry {
                Ok(p) if p.is_file() => out.push(p),
                Ok(_) => {}
                Err(e) => warn!("cannot read glob entry: {:?}", e),
            }
        }
    }
    out.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    out.dedup();
    Ok(out)
}

fn month_label_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    month_label_from_filename(&name).unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(name)
    })
}

/// Enumerate `root/<year>/` for every year in `years` and pair the Nth text
/// bulletin with the Nth spreadsheet in sorted order.
///
/// A missing year directory is recorded and skipped. Text files beyond the
/// spreadsheet count get no spreadsheet; spreadsheets beyond the text count
/// are ignored.
pub fn locate_vintages(
    root: &Path,
    years: RangeInclusive<i32>,
    kinds: &FileKinds<'_>,
) -> Result<Located> {
    let mut located = Located::default();

    for year in years {
        let dir = root.join(year.to_string());
        if !dir.is_dir() {
            info!(year, dir = %dir.display(), "archive year missing, skipping");
            located
                .missing_years
                .push(ExtractError::MissingArchiveYear { year, path: dir });
            continue;
        }

        let texts = list_by_extension(&dir, kinds.text)?;
        let sheets = list_by_extension(&dir, kinds.spreadsheet)?;
        debug!(
            year,
            texts = texts.len(),
            spreadsheets = sheets.len(),
            "listed year"
        );
        if texts.len() != sheets.len() {
            warn!(
                year,
                texts = texts.len(),
                spreadsheets = sheets.len(),
                "bulletin/spreadsheet counts differ; pairing by position"
            );
        }
        for extra in sheets.iter().skip(texts.len()) {
            warn!(path = %extra.display(), "spreadsheet without a bulletin, ignoring");
        }

        let mut sheets = sheets.into_iter();
        for text_path in texts {
            located.vintages.push(ReportVintage {
                year,
                month_label: month_label_for(&text_path),
                text_path,
                spreadsheet_path: sheets.next(),
            });
        }
    }

    Ok(located)
}
