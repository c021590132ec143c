// src/pipeline.rs

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::aggregate::{Aggregator, ConsolidatedDataset, RunSummary};
use crate::analysis::{forecast_errors, MonthlyErrorStats};
use crate::config::PipelineConfig;
use crate::locate::locate_vintages;
use crate::process::row::BalanceRow;
use crate::process::{extract_vintage, VintageOutcome};
use crate::write::{
    write_dataset_csv, write_dataset_parquet, write_manifest_csv, write_records_csv,
    write_summary_json,
};

/// Everything a run produced, after the artifacts have been written.
#[derive(Debug)]
pub struct RunReport {
    pub dataset: ConsolidatedDataset,
    pub summary: RunSummary,
    pub forecast_errors: Vec<MonthlyErrorStats>,
}

/// Locate, extract and aggregate without writing anything.
///
/// Per-vintage failures end up in the summary; only an unusable archive
/// root or glob pattern returns `Err`.
#[instrument(level = "info", skip(cfg), fields(root = %cfg.archive_root.display(), commodity = %cfg.commodity))]
pub fn extract_all(cfg: &PipelineConfig) -> Result<(ConsolidatedDataset, RunSummary)> {
    cfg.validate()?;
    let located = locate_vintages(&cfg.archive_root, cfg.years(), &cfg.file_kinds())
        .context("locating report vintages")?;
    info!(
        vintages = located.vintages.len(),
        missing_years = located.missing_years.len(),
        "located archive"
    );

    let opts = cfg.extract_options();
    // indexed collect keeps locator order, so both paths aggregate identically
    let outcomes: Vec<VintageOutcome> = if cfg.parallel {
        located
            .vintages
            .into_par_iter()
            .map(|v| extract_vintage(v, &opts))
            .collect()
    } else {
        located
            .vintages
            .into_iter()
            .map(|v| extract_vintage(v, &opts))
            .collect()
    };

    let mut agg = Aggregator::new(&cfg.commodity, &located.missing_years);
    for outcome in outcomes {
        agg.push(outcome);
    }
    Ok(agg.finish())
}

/// Full run: extract, then write every configured artifact.
pub fn run(cfg: &PipelineConfig) -> Result<RunReport> {
    let start = Instant::now();
    let (dataset, summary) = extract_all(cfg)?;

    if dataset.is_empty() {
        warn!("no rows extracted; writing an empty dataset");
    }
    write_dataset_csv(&dataset, &cfg.output_csv)
        .with_context(|| format!("writing {}", cfg.output_csv.display()))?;
    if let Some(path) = &cfg.parquet_output {
        write_dataset_parquet(&dataset, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &cfg.manifest_output {
        write_manifest_csv(&summary, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &cfg.summary_output {
        write_summary_json(&summary, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let rows: Vec<&BalanceRow> = dataset.rows().collect();
    let stats = forecast_errors(rows.iter().copied(), cfg.forecast_measure);
    if let Some(path) = &cfg.forecast_errors_output {
        write_records_csv(path, &stats).with_context(|| format!("writing {}", path.display()))?;
    }

    info!(
        rows = dataset.len(),
        elapsed = ?start.elapsed(),
        "pipeline complete"
    );
    Ok(RunReport {
        dataset,
        summary,
        forecast_errors: stats,
    })
}
