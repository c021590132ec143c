// src/process/row.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::process::utils::parse_figure;

/// Number of positions every emitted row occupies:
/// `year, month, output, supply, trade, use, stocks, record_type`.
pub const ROW_WIDTH: usize = 8;

/// Column names of the consolidated artifact, in `BalanceRow` order.
pub const COLUMNS: [&str; ROW_WIDTH] = [
    "year",
    "month",
    "output",
    "supply",
    "trade",
    "use",
    "stocks",
    "record_type",
];

/// How a balance row should be read downstream. Fixed by the row's
/// position inside the commodity block, never by its numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Most recent finalized actuals.
    Data,
    /// Current or next crop-year projection.
    Projected,
    /// Revised estimate for a prior crop year.
    Estimate,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Data => "data",
            RecordType::Projected => "projected",
            RecordType::Estimate => "estimate",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "data" => Ok(RecordType::Data),
            "projected" => Ok(RecordType::Projected),
            "estimate" => Ok(RecordType::Estimate),
            other => Err(format!("unknown record type `{}`", other)),
        }
    }
}

/// A report figure exactly as printed, e.g. `1,062.04` or `790.3*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Figure(String);

impl Figure {
    pub fn new(raw: impl Into<String>) -> Self {
        Figure(raw.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Numeric value, or `None` when the token carries a footnote marker
    /// or is otherwise not a plain number.
    pub fn value(&self) -> Option<f64> {
        parse_figure(&self.0)
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of a commodity's supply/use table from one bulletin.
///
/// Field order is the artifact's column order; serde names match [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRow {
    /// Crop year the figures describe, e.g. `2024/25`.
    pub year: String,
    /// Release-month label; empty on the finalized-actuals row.
    pub month: String,
    pub output: Figure,
    pub supply: Figure,
    pub trade: Figure,
    #[serde(rename = "use")]
    pub total_use: Figure,
    pub stocks: Figure,
    pub record_type: RecordType,
}

/// Which numeric column of a row to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Output,
    Supply,
    Trade,
    Use,
    #[default]
    Stocks,
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "output" => Ok(Measure::Output),
            "supply" => Ok(Measure::Supply),
            "trade" => Ok(Measure::Trade),
            "use" => Ok(Measure::Use),
            "stocks" => Ok(Measure::Stocks),
            other => Err(format!("unknown measure `{}`", other)),
        }
    }
}

impl BalanceRow {
    /// Build a row from a token list that has already been through
    /// column insertion. Returns the actual width when it isn't [`ROW_WIDTH`]
    /// or the last token isn't a record type.
    pub fn try_from_fields(fields: Vec<String>) -> Result<Self, usize> {
        let fields: [String; ROW_WIDTH] = fields.try_into().map_err(|v: Vec<String>| v.len())?;
        let [year, month, output, supply, trade, total_use, stocks, tag] = fields;
        let record_type = tag.parse().map_err(|_| ROW_WIDTH)?;
        Ok(BalanceRow {
            year,
            month,
            output: Figure(output),
            supply: Figure(supply),
            trade: Figure(trade),
            total_use: Figure(total_use),
            stocks: Figure(stocks),
            record_type,
        })
    }

    pub fn figure(&self, measure: Measure) -> &Figure {
        match measure {
            Measure::Output => &self.output,
            Measure::Supply => &self.supply,
            Measure::Trade => &self.trade,
            Measure::Use => &self.total_use,
            Measure::Stocks => &self.stocks,
        }
    }
}
