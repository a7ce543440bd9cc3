pub mod clean;
pub mod config;
pub mod dates;
pub mod error;
pub mod locate;
pub mod output;
pub mod process;
pub mod rules;
pub mod validate;

pub use clean::{CleanOutcome, Cleaner, Engine};
pub use config::{CleanerKind, PipelineConfig, SourceConfig};
pub use dates::ReportDate;
pub use error::CleanError;
pub use rules::{RuleBook, RuleSet};
