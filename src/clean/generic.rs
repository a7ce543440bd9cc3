use std::path::PathBuf;
use tracing::info;

use crate::{
    clean::{CleanOutcome, Cleaner},
    config::SourceConfig,
    dates::ReportDate,
    error::{CleanError, Result},
    locate::locate_files,
    process::combine_files,
    rules::RuleBook,
};

/// Locate every file matching the source pattern, stack them, then apply the
/// source's rule set.
pub struct GenericCleaner {
    root: PathBuf,
    rules: RuleBook,
}

impl GenericCleaner {
    pub fn new(root: impl Into<PathBuf>, rules: RuleBook) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }
}

impl Cleaner for GenericCleaner {
    #[tracing::instrument(level = "info", skip_all, fields(source = %source.name))]
    fn clean(&self, source: &SourceConfig, date: &ReportDate) -> Result<CleanOutcome> {
        let paths = locate_files(&self.root, &source.pattern)?;
        if paths.is_empty() {
            info!(pattern = %source.pattern, "no files found");
            return Ok(CleanOutcome::NoData);
        }
        info!("{} files matched {}", paths.len(), source.pattern);

        let combined = combine_files(&paths, &source.encoding, &source.dtypes)?.ok_or_else(|| {
            CleanError::NoReadableFiles {
                pattern: source.pattern.clone(),
            }
        })?;

        let rules = self.rules.get(&source.name);
        let (table, bad_records) = rules.apply(combined.table, &source.dtypes, &date.iso)?;

        Ok(CleanOutcome::Completed {
            table,
            bad_records,
            inputs: combined.inputs,
        })
    }
}
