// src/output/mod.rs
//! Local stand-ins for the upload / export / archive collaborators.

use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::config::{OutputFormat, PipelineConfig};

/// `{source}_{YYYYMM}.{ext}`
pub fn object_name(source_name: &str, month: &str, format: OutputFormat) -> String {
    format!("{}_{}.{}", source_name, month, format.extension())
}

/// `bad_isrcs_{source}_{YYYYMM}.csv`
pub fn bad_records_name(source_name: &str, month: &str) -> String {
    format!("bad_isrcs_{}_{}.csv", source_name, month)
}

pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer
        .write(batch)
        .with_context(|| format!("writing csv {}", path.display()))?;
    Ok(())
}

pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).context("creating parquet writer")?;
    writer.write(batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Write the cleaned table into `dir` and return its path.
pub fn write_table(
    batch: &RecordBatch,
    dir: &Path,
    source_name: &str,
    month: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating output dir {}", dir.display()))?;
    let path = dir.join(object_name(source_name, month, format));
    match format {
        OutputFormat::Csv => write_csv(batch, &path)?,
        OutputFormat::Parquet => write_parquet(batch, &path)?,
    }
    info!(rows = batch.num_rows(), path = %path.display(), "wrote cleaned table");
    Ok(path)
}

/// Export bad records for manual review. Nothing is written when the source
/// has no validation step or every record passed.
pub fn export_bad_records(
    bad_records: Option<&RecordBatch>,
    dir: &Path,
    source_name: &str,
    month: &str,
) -> Result<Option<PathBuf>> {
    let Some(batch) = bad_records.filter(|b| b.num_rows() > 0) else {
        debug!(source_name, "no bad records to export");
        return Ok(None);
    };
    fs::create_dir_all(dir).with_context(|| format!("creating exports dir {}", dir.display()))?;
    let path = dir.join(bad_records_name(source_name, month));
    write_csv(batch, &path)?;
    warn!(count = batch.num_rows(), path = %path.display(), "exported bad ISRCs");
    Ok(Some(path))
}

/// Move each input under `archive_dir`, keeping its path relative to `root`.
pub fn archive_inputs(
    inputs: &[PathBuf],
    root: &Path,
    archive_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut moved = Vec::with_capacity(inputs.len());
    for input in inputs {
        let rel = input.strip_prefix(root).unwrap_or(input.as_path());
        let rel = rel.strip_prefix("/").unwrap_or(rel);
        let target = archive_dir.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating archive dir {}", parent.display()))?;
        }
        fs::rename(input, &target).with_context(|| {
            format!("archiving {} to {}", input.display(), target.display())
        })?;
        debug!(from = %input.display(), to = %target.display(), "archived");
        moved.push(target);
    }
    Ok(moved)
}

/// Deliver one cleaned source: the table, then its bad records, then the
/// inputs are archived. Both outputs are on disk before any input moves.
pub fn publish(
    cfg: &PipelineConfig,
    source_name: &str,
    month: &str,
    root: &Path,
    table: &RecordBatch,
    bad_records: Option<&RecordBatch>,
    inputs: &[PathBuf],
) -> Result<()> {
    write_table(table, &cfg.output.dir, source_name, month, cfg.output.format)
        .context("writing cleaned table")?;
    export_bad_records(bad_records, &cfg.exports_dir, source_name, month)
        .context("exporting bad records")?;
    archive_inputs(inputs, root, &cfg.archive_dir).context("archiving inputs")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn cleaned() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("ISRC", DataType::Utf8, true),
            Field::new("Total", DataType::Float64, true),
            Field::new("date", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![Some("BBB22000001"), None])),
                Arc::new(Float64Array::from(vec![15.5, 0.25])),
                Arc::new(StringArray::from(vec!["2024-03-01", "2024-03-01"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn names_follow_the_warehouse_convention() {
        assert_eq!(
            object_name("a_video_report", "202403", OutputFormat::Csv),
            "a_video_report_202403.csv"
        );
        assert_eq!(
            bad_records_name("a_revenue_report", "202403"),
            "bad_isrcs_a_revenue_report_202403.csv"
        );
    }

    #[test]
    fn csv_output_has_header_and_rows() -> Result<()> {
        let dir = tempdir()?;
        let format = OutputFormat::Csv;
        let path = write_table(&cleaned(), dir.path(), "a_video_report", "202403", format)?;
        let written = fs::read_to_string(&path)?;
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("ISRC,Total,date"));
        assert_eq!(lines.next(), Some("BBB22000001,15.5,2024-03-01"));
        assert_eq!(lines.next(), Some(",0.25,2024-03-01"));
        assert_eq!(lines.next(), None);
        Ok(())
    }

    #[test]
    fn parquet_output_round_trips_row_count() -> Result<()> {
        let dir = tempdir()?;
        let format = OutputFormat::Parquet;
        let path = write_table(&cleaned(), dir.path(), "a_video_report", "202403", format)?;
        assert!(path.ends_with("a_video_report_202403.parquet"));
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let rows: usize = reader.map(|b| b.map(|b| b.num_rows())).sum::<Result<usize, _>>()?;
        assert_eq!(rows, 2);
        Ok(())
    }

    #[test]
    fn empty_or_absent_bad_records_are_not_exported() -> Result<()> {
        let dir = tempdir()?;
        assert!(export_bad_records(None, dir.path(), "a", "202403")?.is_none());
        let empty = cleaned().slice(0, 0);
        assert!(export_bad_records(Some(&empty), dir.path(), "a", "202403")?.is_none());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);

        let batch = cleaned();
        let path = export_bad_records(Some(&batch), dir.path(), "a", "202403")?.unwrap();
        assert!(path.ends_with("bad_isrcs_a_202403.csv"));
        Ok(())
    }

    fn local_config(root: &Path) -> PipelineConfig {
        let mut cfg = PipelineConfig::from_yaml("sources: []\n").unwrap();
        cfg.output.dir = root.join("output");
        cfg.exports_dir = root.join("exports");
        cfg.archive_dir = root.join("processed");
        cfg
    }

    #[test]
    fn publish_writes_exports_then_archives() -> Result<()> {
        let root = tempdir()?;
        let input = root.path().join("source/a_revenue_report_1.csv");
        fs::create_dir_all(input.parent().unwrap())?;
        fs::write(&input, "ISRC\n")?;
        let cfg = local_config(root.path());

        let table = cleaned();
        let inputs = [input.clone()];
        publish(&cfg, "a_revenue_report", "202403", root.path(), &table, Some(&table), &inputs)?;
        assert!(cfg.output.dir.join("a_revenue_report_202403.csv").exists());
        assert!(cfg.exports_dir.join("bad_isrcs_a_revenue_report_202403.csv").exists());
        assert!(cfg.archive_dir.join("source/a_revenue_report_1.csv").exists());
        assert!(!input.exists());
        Ok(())
    }

    #[test]
    fn bad_records_survive_a_failed_archive() -> Result<()> {
        let root = tempdir()?;
        let cfg = local_config(root.path());
        // already gone, so the move fails
        let missing = root.path().join("source/a_revenue_report_1.csv");

        let table = cleaned();
        let inputs = [missing];
        let bad = Some(&table);
        let err = publish(&cfg, "a_revenue_report", "202403", root.path(), &table, bad, &inputs)
            .unwrap_err();
        assert!(format!("{err:#}").contains("archiving"));
        assert!(cfg.output.dir.join("a_revenue_report_202403.csv").exists());
        assert!(cfg.exports_dir.join("bad_isrcs_a_revenue_report_202403.csv").exists());
        Ok(())
    }

    #[test]
    fn archive_keeps_relative_layout() -> Result<()> {
        let root = tempdir()?;
        let input = root.path().join("source/a_video_report_1.csv");
        fs::create_dir_all(input.parent().unwrap())?;
        fs::write(&input, "ISRC\n")?;
        let archive = root.path().join("processed");

        let moved = archive_inputs(&[input.clone()], root.path(), &archive)?;
        assert_eq!(moved, vec![archive.join("source/a_video_report_1.csv")]);
        assert!(!input.exists());
        assert!(moved[0].exists());
        Ok(())
    }
}
