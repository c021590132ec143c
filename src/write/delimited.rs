// src/write/delimited.rs

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use super::replace_file;
use crate::aggregate::ConsolidatedDataset;
use crate::process::row::COLUMNS;

/// Serialize `records` as a headed CSV at `path`, fully replacing it.
pub fn write_records_csv<'a, T, I>(path: &Path, records: I) -> Result<usize>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut count = 0;
    replace_file(path, |out| {
        let mut wtr = csv::Writer::from_writer(out);
        for record in records {
            wtr.serialize(record)
                .with_context(|| format!("serializing record {} for {:?}", count, path))?;
            count += 1;
        }
        wtr.flush()?;
        Ok(())
    })?;
    Ok(count)
}

/// Write the consolidated dataset with columns
/// `year, month, output, supply, trade, use, stocks, record_type`.
/// Figures are written exactly as printed in the bulletin. The header is
/// written even when there are no rows.
pub fn write_dataset_csv(dataset: &ConsolidatedDataset, path: &Path) -> Result<usize> {
    let mut rows = 0;
    replace_file(path, |out| {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        wtr.write_record(COLUMNS)?;
        for row in dataset.rows() {
            wtr.serialize(row)
                .with_context(|| format!("serializing row {} for {:?}", rows, path))?;
            rows += 1;
        }
        wtr.flush()?;
        Ok(())
    })?;
    info!(rows, path = %path.display(), "wrote consolidated CSV");
    Ok(rows)
}
