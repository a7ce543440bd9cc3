use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    clean::{CleanOutcome, Cleaner},
    config::{ColumnType, DtypeMap, SourceConfig},
    dates::ReportDate,
    error::{CleanError, Result},
    locate::locate_first,
    process::{concat_tables, read::read_csv, stamp_date, utils::resolve_encoding},
    rules::ValidationRule,
};

/// Where the two companion snapshots live and how they are read.
#[derive(Debug, Clone)]
pub struct DualFileLayout {
    /// Relative to the cleaner root.
    pub dir: PathBuf,
    pub subscription_pattern: String,
    pub subscription_encoding: String,
    pub monetization_pattern: String,
    pub monetization_encoding: String,
    pub dtypes: DtypeMap,
    pub validation: ValidationRule,
}

impl Default for DualFileLayout {
    fn default() -> Self {
        let mut dtypes = DtypeMap::new();
        dtypes.insert("request_month".into(), ColumnType::Text);
        dtypes.insert("streams_downloads".into(), ColumnType::NullableInt);
        Self {
            dir: PathBuf::from("source"),
            subscription_pattern: "b_revenue_report_??????.csv".into(),
            subscription_encoding: "utf-8".into(),
            monetization_pattern: "b_revenue_report_v2_*.csv".into(),
            monetization_encoding: "cp932".into(),
            dtypes,
            // this exporter writes the label column in lower case
            validation: ValidationRule::new("ISRC", "title"),
        }
    }
}

/// Merges the subscription and monetization (v2) snapshot pair.
pub struct DualFileCleaner {
    root: PathBuf,
    layout: DualFileLayout,
}

impl DualFileCleaner {
    pub fn new(root: impl Into<PathBuf>, layout: DualFileLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    fn read_snapshot(&self, path: &Path, encoding: &str) -> Result<RecordBatch> {
        let mut raw = read_csv(path, resolve_encoding(encoding)?)?;
        // exporter appends a summary row
        raw.drop_last_row();
        raw.into_batch(&self.layout.dtypes)
    }
}

impl Cleaner for DualFileCleaner {
    #[tracing::instrument(level = "info", skip_all, fields(source = %source.name))]
    fn clean(&self, source: &SourceConfig, date: &ReportDate) -> Result<CleanOutcome> {
        let dir = self.root.join(&self.layout.dir);
        let subscription = locate_first(&dir, &self.layout.subscription_pattern)?;
        let monetization = locate_first(&dir, &self.layout.monetization_pattern)?;
        let (subscription, monetization) = match (subscription, monetization) {
            (Some(s), Some(m)) => (s, m),
            (s, m) => {
                info!(
                    subscription = s.is_some(),
                    monetization = m.is_some(),
                    "companion file missing"
                );
                return Ok(CleanOutcome::NoData);
            }
        };

        let mon = self.read_snapshot(&monetization, &self.layout.monetization_encoding)?;
        let sub = self.read_snapshot(&subscription, &self.layout.subscription_encoding)?;
        info!(
            monetization_rows = mon.num_rows(),
            subscription_rows = sub.num_rows(),
            "read snapshots"
        );

        let snapshots = vec![(monetization.clone(), mon), (subscription.clone(), sub)];
        let combined = concat_tables(snapshots)?
            .ok_or_else(|| CleanError::NoReadableFiles {
                pattern: self.layout.monetization_pattern.clone(),
            })?;
        let table = stamp_date(&combined, &date.iso)?;
        let bad_records = self.layout.validation.extract(&table)?;

        Ok(CleanOutcome::Completed {
            table,
            bad_records: Some(bad_records),
            inputs: vec![monetization, subscription],
        })
    }
}
