// src/process/mod.rs
//! Reading report files into arrow tables and the column-level rules applied
//! to them.

pub mod combine;
pub mod convert;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod raw_table;
pub mod read;
pub mod transform;
pub mod utils;

pub use combine::{combine_files, concat_tables, CombinedFiles};
pub use raw_table::RawTable;
pub use read::{read_report, FileFormat};
pub use transform::{add_total, replace_with_null, stamp_date, DATE_COLUMN};
