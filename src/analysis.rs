// src/analysis.rs

//! Forecast accuracy of the projections and estimates in a consolidated
//! dataset, measured against each crop year's finalized `data` row.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::process::row::{BalanceRow, Measure, RecordType};

/// Error statistics for all forecasts published under one release-month label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyErrorStats {
    pub month: String,
    /// Mean of forecast minus final; positive means over-forecast.
    pub mean_error: f64,
    pub mean_abs_error: f64,
    pub count: usize,
}

/// Final value per crop year. When several vintages report a `data` row for
/// the same crop year, the last one in dataset order wins.
pub fn final_values<'a, I>(rows: I, measure: Measure) -> HashMap<&'a str, f64>
where
    I: IntoIterator<Item = &'a BalanceRow>,
{
    rows.into_iter()
        .filter(|r| r.record_type == RecordType::Data)
        .filter_map(|r| Some((r.year.as_str(), r.figure(measure).value()?)))
        .collect()
}

/// Group every non-`data` row by release month and compare it with the final
/// value of its crop year. Rows without a final value, or whose figure does
/// not parse, are left out. Output is ordered by month label.
pub fn forecast_errors<'a, I>(rows: I, measure: Measure) -> Vec<MonthlyErrorStats>
where
    I: IntoIterator<Item = &'a BalanceRow>,
    I::IntoIter: Clone,
{
    let rows = rows.into_iter();
    let finals = final_values(rows.clone(), measure);

    let mut by_month: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for row in rows.filter(|r| r.record_type != RecordType::Data) {
        let (Some(forecast), Some(&final_value)) =
            (row.figure(measure).value(), finals.get(row.year.as_str()))
        else {
            continue;
        };
        let err = forecast - final_value;
        let acc = by_month.entry(row.month.as_str()).or_default();
        acc.0 += err;
        acc.1 += err.abs();
        acc.2 += 1;
    }
    debug!(
        finals = finals.len(),
        months = by_month.len(),
        "computed forecast errors"
    );

    by_month
        .into_iter()
        .map(|(month, (sum, abs_sum, count))| MonthlyErrorStats {
            month: month.to_string(),
            mean_error: sum / count as f64,
            mean_abs_error: abs_sum / count as f64,
            count,
        })
        .collect()
}
