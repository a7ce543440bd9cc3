// src/clean/mod.rs
//! Per-source cleaning: the two strategies and the engine that picks one.

pub mod dual_file;
pub mod generic;

use arrow::record_batch::RecordBatch;
use std::path::PathBuf;
use tracing::info;

use crate::{
    config::{CleanerKind, SourceConfig},
    dates::ReportDate,
    error::Result,
    rules::RuleBook,
};

pub use dual_file::{DualFileCleaner, DualFileLayout};
pub use generic::GenericCleaner;

/// Result of one source invocation.
#[derive(Debug)]
pub enum CleanOutcome {
    Completed {
        table: RecordBatch,
        /// `None` when the source's rules declare no validation step.
        bad_records: Option<RecordBatch>,
        /// Files that contributed rows, in concatenation order.
        inputs: Vec<PathBuf>,
    },
    /// Nothing matched the pattern, or a companion file is missing.
    NoData,
}

impl CleanOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, CleanOutcome::NoData)
    }
}

/// A cleaning strategy.
pub trait Cleaner {
    fn clean(&self, source: &SourceConfig, date: &ReportDate) -> Result<CleanOutcome>;
}

/// Runs one source through the cleaner its config declares.
pub struct Engine {
    generic: GenericCleaner,
    dual_file: DualFileCleaner,
}

impl Engine {
    /// `root` is the directory source patterns are resolved against.
    pub fn new(root: impl Into<PathBuf>, rules: RuleBook) -> Self {
        Self::with_layout(root, rules, DualFileLayout::default())
    }

    pub fn with_layout(root: impl Into<PathBuf>, rules: RuleBook, layout: DualFileLayout) -> Self {
        let root = root.into();
        Self {
            generic: GenericCleaner::new(root.clone(), rules),
            dual_file: DualFileCleaner::new(root, layout),
        }
    }

    pub fn cleaner(&self, kind: CleanerKind) -> &dyn Cleaner {
        match kind {
            CleanerKind::Generic => &self.generic,
            CleanerKind::DualFile => &self.dual_file,
        }
    }

    /// Clean `source` for the period `date`. Unknown cleaner kinds fail
    /// before any file is read.
    pub fn run(&self, source: &SourceConfig, date: &ReportDate) -> Result<CleanOutcome> {
        let kind = source.cleaner_kind()?;
        info!(source = %source.name, cleaner = %kind, period = %date.iso, "cleaning source");
        self.cleaner(kind).clean(source, date)
    }
}
