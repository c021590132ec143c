// src/bin/forecast_errors.rs

use anyhow::{anyhow, Context, Result};
use std::{env, path::PathBuf};
use wasdeparser::{
    analysis::forecast_errors,
    process::row::{BalanceRow, Measure},
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if !(2..=3).contains(&args.len()) {
        return Err(anyhow!(
            "Usage: {} <CONSOLIDATED_CSV> [output|supply|trade|use|stocks]",
            args[0]
        ));
    }
    let path = PathBuf::from(&args[1]);
    let measure: Measure = match args.get(2) {
        Some(m) => m.parse().map_err(|e: String| anyhow!(e))?,
        None => Measure::default(),
    };

    let mut rdr = csv::Reader::from_path(&path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    let rows: Vec<BalanceRow> = rdr
        .deserialize()
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to read rows from '{}'", path.display()))?;

    let stats = forecast_errors(&rows, measure);
    println!(
        "\n{} rows, measure {:?}\n\n{: <8} {:>12} {:>12} {:>6}",
        rows.len(),
        measure,
        "Month",
        "Mean err",
        "MAE",
        "N"
    );
    println!("{:-<41}", "");
    for s in &stats {
        println!(
            "{: <8} {:>12.3} {:>12.3} {:>6}",
            s.month, s.mean_error, s.mean_abs_error, s.count
        );
    }
    Ok(())
}
