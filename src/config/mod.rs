// src/config/mod.rs

pub mod dtypes;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{error::CleanError, rules::RuleSet};

pub use dtypes::{ColumnType, DtypeMap};

pub const DEFAULT_ENCODING: &str = "utf-8";

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

/// Which cleaning strategy a source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerKind {
    /// Any number of same-shaped files, cleaned by the source's rule set.
    Generic,
    /// The subscription + monetization snapshot pair.
    DualFile,
}

impl FromStr for CleanerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "generic" | "a_data" => Ok(CleanerKind::Generic),
            "dual_file" | "b_data" => Ok(CleanerKind::DualFile),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for CleanerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanerKind::Generic => f.write_str("generic"),
            CleanerKind::DualFile => f.write_str("dual_file"),
        }
    }
}

/// One configured input feed.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Glob relative to the working directory.
    #[serde(default)]
    pub pattern: String,
    /// Kept as declared; see [`SourceConfig::cleaner_kind`].
    pub cleaner: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub dtypes: DtypeMap,

    // consumed by the upload/load collaborators only
    pub bucket: Option<String>,
    pub dataset: Option<String>,
    pub table: Option<String>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, cleaner: CleanerKind) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            cleaner: cleaner.to_string(),
            encoding: default_encoding(),
            dtypes: DtypeMap::new(),
            bucket: None,
            dataset: None,
            table: None,
        }
    }

    pub fn with_dtype(mut self, column: impl Into<String>, ty: ColumnType) -> Self {
        self.dtypes.insert(column.into(), ty);
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn cleaner_kind(&self) -> std::result::Result<CleanerKind, CleanError> {
        self.cleaner
            .parse()
            .map_err(|cleaner| CleanError::UnknownCleaner {
                source_name: self.name.clone(),
                cleaner,
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

/// Top-level `pipeline.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub project_id: Option<String>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
    pub sources: Vec<SourceConfig>,
    /// Extra or replacement rule sets, keyed by source name.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSet>,
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("processed")
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing pipeline config")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Configuration problems that are fatal for the named source. Checked
    /// before any report file is touched.
    pub fn validate(&self) -> Vec<CleanError> {
        let mut problems = Vec::new();
        for source in &self.sources {
            if let Err(e) = source.cleaner_kind() {
                problems.push(e);
            }
        }
        problems
    }
}
