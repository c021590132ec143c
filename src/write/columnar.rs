// src/write/columnar.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{path::Path, sync::Arc};
use tracing::info;

use super::replace_file;
use crate::aggregate::ConsolidatedDataset;
use crate::process::row::{BalanceRow, Measure};
use crate::process::ExtractedVintage;

/// Consolidated rows with their vintage provenance; figures typed as Float64.
pub fn dataset_schema() -> Schema {
    Schema::new(vec![
        Field::new("vintage_year", DataType::Int32, false),
        Field::new("vintage_month", DataType::Utf8, false),
        Field::new("report_date", DataType::Utf8, true),
        Field::new("year", DataType::Utf8, false),
        Field::new("month", DataType::Utf8, false),
        Field::new("output", DataType::Float64, true),
        Field::new("supply", DataType::Float64, true),
        Field::new("trade", DataType::Float64, true),
        Field::new("use", DataType::Float64, true),
        Field::new("stocks", DataType::Float64, true),
        Field::new("record_type", DataType::Utf8, false),
    ])
}

fn figure_column(entries: &[(&ExtractedVintage, &BalanceRow)], measure: Measure) -> ArrayRef {
    Arc::new(Float64Array::from(
        entries
            .iter()
            .map(|(_, r)| r.figure(measure).value())
            .collect::<Vec<_>>(),
    ))
}

/// Build a single record batch covering the whole dataset.
pub fn dataset_batch(dataset: &ConsolidatedDataset) -> Result<RecordBatch> {
    let entries: Vec<_> = dataset.entries().collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(
            entries.iter().map(|(v, _)| v.vintage.year).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            entries
                .iter()
                .map(|(v, _)| v.vintage.month_label.as_str())
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            entries
                .iter()
                .map(|(v, _)| v.report_date.as_deref())
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            entries.iter().map(|(_, r)| r.year.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            entries.iter().map(|(_, r)| r.month.as_str()).collect::<Vec<_>>(),
        )),
        figure_column(&entries, Measure::Output),
        figure_column(&entries, Measure::Supply),
        figure_column(&entries, Measure::Trade),
        figure_column(&entries, Measure::Use),
        figure_column(&entries, Measure::Stocks),
        Arc::new(StringArray::from(
            entries
                .iter()
                .map(|(_, r)| r.record_type.as_str())
                .collect::<Vec<_>>(),
        )),
    ];

    RecordBatch::try_new(Arc::new(dataset_schema()), columns)
        .context("building consolidated record batch")
}

/// Write the dataset as a single Parquet file, replacing any previous one.
pub fn write_dataset_parquet(dataset: &ConsolidatedDataset, path: &Path) -> Result<()> {
    let batch = dataset_batch(dataset)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    replace_file(path, |out| {
        let mut writer = ArrowWriter::try_new(out, batch.schema(), Some(props))
            .context("creating Arrow writer for consolidated dataset")?;
        writer.write(&batch).context("writing consolidated batch")?;
        writer.close().context("closing consolidated writer")?;
        Ok(())
    })?;
    info!(rows = batch.num_rows(), path = %path.display(), "wrote consolidated Parquet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use arrow::array::Array;
    use crate::locate::ReportVintage;
    use crate::process::block::parse_bulletin;
    use crate::process::VintageOutcome;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::{fs::File, path::PathBuf};
    use tempfile::tempdir;

    fn dataset() -> ConsolidatedDataset {
        let text = "Wheat\n   2022/23  789.17  1,061.54  220.55  791.41  270.13\n   2023/24 Est.  1 2 3 4 NA\n";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        let mut agg = Aggregator::new("Wheat", &[]);
        agg.push(VintageOutcome::Extracted(ExtractedVintage {
            vintage: ReportVintage {
                year: 2024,
                month_label: "Feb".into(),
                text_path: PathBuf::from("2024/wasde0224.txt"),
                spreadsheet_path: None,
            },
            report_date: None,
            commodity_label: None,
            sheet_issues: Vec::new(),
            lines_in_block: block.lines_in_block,
            flags: block.flags,
            rows: block.rows,
        }));
        agg.finish().0
    }

    #[test]
    fn batch_types_figures_and_keeps_provenance() -> Result<()> {
        let batch = dataset_batch(&dataset())?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 11);

        let supply = batch
            .column(6)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(supply.value(0), 1061.54);

        let stocks = batch
            .column(9)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!(stocks.is_null(1));

        let report_date = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(report_date.is_null(0));
        Ok(())
    }

    #[test]
    fn parquet_file_reads_back() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("wheat.parquet");
        write_dataset_parquet(&dataset(), &path)?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let mut rows = 0;
        for batch in reader {
            rows += batch?.num_rows();
        }
        assert_eq!(rows, 2);
        Ok(())
    }
}
