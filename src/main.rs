use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use wasdeparser::{
    aggregate::VintageStatus,
    config::PipelineConfig,
    pipeline,
    process::row::Measure,
};

/// Extract one commodity's supply/use table from an archive of WASDE
/// bulletins into a single consolidated dataset.
#[derive(Parser, Debug)]
#[command(name = "wasdeparser", version)]
struct Cli {
    /// YAML config file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Archive root holding one directory per year.
    #[arg(long)]
    root: Option<PathBuf>,
    #[arg(long)]
    from: Option<i32>,
    #[arg(long)]
    to: Option<i32>,
    /// Commodity label as printed in the bulletin, e.g. `Wheat`.
    #[arg(long)]
    commodity: Option<String>,
    /// Consolidated CSV output.
    #[arg(short, long)]
    out: Option<PathBuf>,
    #[arg(long)]
    parquet: Option<PathBuf>,
    /// Per-vintage manifest CSV.
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Run summary JSON.
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Per-month forecast error CSV.
    #[arg(long)]
    forecast_errors: Option<PathBuf>,
    /// Measure the forecast errors are computed on.
    #[arg(long)]
    measure: Option<Measure>,
    /// Extract vintages in parallel.
    #[arg(long)]
    parallel: bool,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(v) = self.root {
            cfg.archive_root = v;
        }
        if let Some(v) = self.from {
            cfg.first_year = v;
        }
        if let Some(v) = self.to {
            cfg.last_year = v;
        }
        if let Some(v) = self.commodity {
            cfg.commodity = v;
        }
        if let Some(v) = self.out {
            cfg.output_csv = v;
        }
        if self.parquet.is_some() {
            cfg.parquet_output = self.parquet;
        }
        if self.manifest.is_some() {
            cfg.manifest_output = self.manifest;
        }
        if self.summary.is_some() {
            cfg.summary_output = self.summary;
        }
        if self.forecast_errors.is_some() {
            cfg.forecast_errors_output = self.forecast_errors;
        }
        if let Some(v) = self.measure {
            cfg.forecast_measure = v;
        }
        cfg.parallel |= self.parallel;
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wasdeparser=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let cfg = Cli::parse().into_config()?;
    info!(
        root = %cfg.archive_root.display(),
        years = ?cfg.years(),
        commodity = %cfg.commodity,
        "startup"
    );

    // ─── 3) run ──────────────────────────────────────────────────────
    let report = pipeline::run(&cfg)?;
    let summary = &report.summary;

    // ─── 4) print summary table ──────────────────────────────────────
    println!(
        "\n{: <10} {:>10} {:>10} {:>10} {:>10}",
        "Vintages", "Extracted", "Skipped", "Failed", "Rows"
    );
    println!("{:-<54}", "");
    println!(
        "{: <10} {:>10} {:>10} {:>10} {:>10}",
        summary.vintages.len(),
        summary.count(VintageStatus::Extracted),
        summary.count(VintageStatus::Skipped),
        summary.count(VintageStatus::Failed),
        summary.rows
    );
    if !summary.missing_years.is_empty() {
        println!("\nmissing archive years: {:?}", summary.missing_years);
    }

    let attention: Vec<_> = summary.needs_attention().collect();
    if !attention.is_empty() {
        println!("\n{: <6} {: <8} {: <9} {}", "Year", "Month", "Status", "Issues");
        println!("{:-<70}", "");
        for r in attention {
            println!(
                "{: <6} {: <8} {: <9} {}",
                r.year,
                r.month_label,
                format!("{:?}", r.status).to_lowercase(),
                r.issues.join("; ")
            );
        }
    }

    if !report.forecast_errors.is_empty() {
        println!(
            "\n{: <8} {:>12} {:>12} {:>6}",
            "Month", "Mean err", "MAE", "N"
        );
        println!("{:-<41}", "");
        for s in &report.forecast_errors {
            println!(
                "{: <8} {:>12.3} {:>12.3} {:>6}",
                s.month, s.mean_error, s.mean_abs_error, s.count
            );
        }
    }

    if summary.count(VintageStatus::Failed) > 0 {
        warn!("some vintages failed; see the table above");
    }
    info!(path = %cfg.output_csv.display(), "done");
    Ok(())
}
