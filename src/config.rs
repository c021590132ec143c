// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use crate::locate::FileKinds;
use crate::process::row::Measure;
use crate::process::spreadsheet::{CellRef, SheetLayout};
use crate::process::ExtractOptions;

/// Everything one extraction run needs. Every field has a default, so a
/// YAML file only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding one subdirectory per archive year.
    pub archive_root: PathBuf,
    pub first_year: i32,
    pub last_year: i32,
    /// Commodity label as capitalised in the text bulletin.
    pub commodity: String,
    pub text_extensions: Vec<String>,
    pub spreadsheet_extensions: Vec<String>,
    pub date_sheet: usize,
    pub date_cell: CellRef,
    pub commodity_sheet: usize,
    pub output_csv: PathBuf,
    pub parquet_output: Option<PathBuf>,
    pub manifest_output: Option<PathBuf>,
    pub summary_output: Option<PathBuf>,
    pub forecast_errors_output: Option<PathBuf>,
    pub forecast_measure: Measure,
    /// Extract vintages on the rayon pool; output is identical either way.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from("data/downloaded_reports"),
            first_year: 2017,
            last_year: 2025,
            commodity: "Wheat".into(),
            text_extensions: vec!["txt".into()],
            spreadsheet_extensions: vec!["xls".into(), "xlsx".into()],
            date_sheet: 1,
            date_cell: CellRef::default(),
            commodity_sheet: 0,
            output_csv: PathBuf::from("wheat_all_data.csv"),
            parquet_output: None,
            manifest_output: None,
            summary_output: None,
            forecast_errors_output: None,
            forecast_measure: Measure::Stocks,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Load a YAML config file; absent keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_year > self.last_year {
            bail!(
                "first_year {} is after last_year {}",
                self.first_year,
                self.last_year
            );
        }
        if self.commodity.trim().is_empty() {
            bail!("commodity label is empty");
        }
        if self.text_extensions.is_empty() {
            bail!("no text bulletin extensions configured");
        }
        if self.spreadsheet_extensions.is_empty() {
            bail!("no spreadsheet extensions configured");
        }
        Ok(())
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    pub fn file_kinds(&self) -> FileKinds<'_> {
        FileKinds {
            text: &self.text_extensions,
            spreadsheet: &self.spreadsheet_extensions,
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            commodity: self.commodity.clone(),
            layout: SheetLayout {
                date_sheet: self.date_sheet,
                date_cell: self.date_cell,
                commodity_sheet: self.commodity_sheet,
            },
        }
    }
}
