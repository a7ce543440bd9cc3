//! Per-source business rules, keyed by source name.
//!
//! New report variants are added by registering a [`RuleSet`] (in code via
//! [`RuleBook::builtin`] or in the `rules:` map of the pipeline config), not by
//! branching in the cleaners.

use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    config::DtypeMap,
    error::Result,
    process::transform::{add_total, replace_with_null, stamp_date},
    validate::{extract_bad_records, DEFAULT_ISRC_PREFIX},
};

/// Sum of several numeric columns written to one derived column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TotalRule {
    #[serde(default = "default_total_column")]
    pub output: String,
    pub inputs: Vec<String>,
}

fn default_total_column() -> String {
    "Total".to_string()
}

/// Literal placeholder values that mean "no data" in the named columns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NullMarkerRule {
    pub columns: Vec<String>,
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_marker() -> String {
    "Unknown".to_string()
}

/// Identifier/label pair checked against the label's ISRC prefix.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidationRule {
    pub id_column: String,
    pub label_column: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_ISRC_PREFIX.to_string()
}

impl ValidationRule {
    pub fn new(id_column: &str, label_column: &str) -> Self {
        Self {
            id_column: id_column.to_string(),
            label_column: label_column.to_string(),
            prefix: default_prefix(),
        }
    }

    pub fn extract(&self, table: &RecordBatch) -> Result<RecordBatch> {
        extract_bad_records(table, &self.id_column, &self.label_column, &self.prefix)
    }
}

/// Everything the generic cleaner does to one source beyond combining files.
/// The empty set only stamps the report date.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub total: Option<TotalRule>,
    #[serde(default)]
    pub null_markers: Vec<NullMarkerRule>,
    #[serde(default)]
    pub validation: Option<ValidationRule>,
}

/// The cleaned table and, when the rule set validates, its bad records.
pub type Cleaned = (RecordBatch, Option<RecordBatch>);

impl RuleSet {
    /// Apply, in order: total, null markers, date stamp, validation.
    pub fn apply(&self, table: RecordBatch, dtypes: &DtypeMap, iso_date: &str) -> Result<Cleaned> {
        let mut table = table;
        if let Some(total) = &self.total {
            table = add_total(&table, &total.output, &total.inputs, dtypes)?;
        }
        for rule in &self.null_markers {
            table = replace_with_null(&table, &rule.columns, &rule.marker)?;
        }
        let table = stamp_date(&table, iso_date)?;
        let bad_records = match &self.validation {
            Some(rule) => Some(rule.extract(&table)?),
            None => None,
        };
        Ok((table, bad_records))
    }
}

fn revenue_total() -> TotalRule {
    TotalRule {
        output: default_total_column(),
        inputs: vec![
            "Ad Revenue".into(),
            "Streaming Revenue".into(),
            "Copyright Revenue".into(),
        ],
    }
}

static BUILTIN: Lazy<BTreeMap<String, RuleSet>> = Lazy::new(|| {
    let mut sets = BTreeMap::new();
    sets.insert(
        "a_video_report".to_string(),
        RuleSet {
            total: Some(revenue_total()),
            null_markers: vec![NullMarkerRule {
                columns: vec!["Total Views".into(), "Premium Views".into()],
                marker: default_marker(),
            }],
            validation: None,
        },
    );
    sets.insert(
        "a_revenue_report".to_string(),
        RuleSet {
            total: Some(revenue_total()),
            null_markers: Vec::new(),
            validation: Some(ValidationRule::new("ISRC", "Title")),
        },
    );
    sets
});

/// Source name → rule set. Lookup is by exact name.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    sets: BTreeMap<String, RuleSet>,
}

static EMPTY: RuleSet = RuleSet {
    total: None,
    null_markers: Vec::new(),
    validation: None,
};

impl RuleBook {
    /// The rule sets of the known report variants.
    pub fn builtin() -> Self {
        Self {
            sets: BUILTIN.clone(),
        }
    }

    /// Add or replace rule sets.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, RuleSet>) -> Self {
        for (name, set) in overrides {
            self.sets.insert(name.clone(), set.clone());
        }
        self
    }

    pub fn insert(&mut self, source_name: impl Into<String>, rules: RuleSet) {
        self.sets.insert(source_name.into(), rules);
    }

    pub fn get(&self, source_name: &str) -> &RuleSet {
        match self.sets.get(source_name) {
            Some(set) => set,
            None => {
                debug!(source_name, "no rule set registered, date stamping only");
                &EMPTY
            }
        }
    }
}
