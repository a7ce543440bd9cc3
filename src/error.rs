use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

/// Everything that can make a single source's cleaning run fail.
///
/// "No input files" is not in here: that is the normal
/// [`CleanOutcome::NoData`](crate::clean::CleanOutcome::NoData) result.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("column set of {path} does not match: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{path} is not valid {encoding}")]
    Encoding { path: PathBuf, encoding: String },

    #[error("unknown text encoding `{0}`")]
    UnknownEncoding(String),

    #[error("cannot read value {value:?} in column `{column}` (row {row}) as {expected}")]
    TypeCoercion {
        column: String,
        row: usize,
        value: Option<String>,
        expected: String,
    },

    #[error("source `{source_name}` declares unknown cleaner `{cleaner}`")]
    UnknownCleaner { source_name: String, cleaner: String },

    #[error("unknown column type `{0}`")]
    UnknownColumnType(String),

    #[error("column `{0}` not found")]
    MissingColumn(String),

    #[error("none of the files matching `{pattern}` has a readable format")]
    NoReadableFiles { pattern: String },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} line {line}: {fields} fields, header has {expected}")]
    RowTooLong {
        path: PathBuf,
        line: u64,
        fields: usize,
        expected: usize,
    },

    #[error("spreadsheet error in {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

pub type Result<T> = std::result::Result<T, CleanError>;
