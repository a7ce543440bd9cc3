use arrow::{
    array::{Array, ArrayRef, BooleanArray, StringArray, UInt32Array},
    compute::{cast, filter_record_batch, take_record_batch},
    datatypes::DataType,
    record_batch::RecordBatch,
    row::{RowConverter, SortField},
};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{CleanError, Result};

/// ISRC registrant prefix every one of our recordings carries.
pub const DEFAULT_ISRC_PREFIX: &str = "AAA11";

/// Rows whose `id_column` is missing or does not start with `prefix`,
/// projected to `[id_column, label_column]` with exact duplicates removed
/// (first occurrence kept, order preserved).
pub fn extract_bad_records(
    table: &RecordBatch,
    id_column: &str,
    label_column: &str,
    prefix: &str,
) -> Result<RecordBatch> {
    let schema = table.schema();
    let id_idx = schema
        .index_of(id_column)
        .map_err(|_| CleanError::MissingColumn(id_column.to_string()))?;
    let label_idx = schema
        .index_of(label_column)
        .map_err(|_| CleanError::MissingColumn(label_column.to_string()))?;
    let projected = table.project(&[id_idx, label_idx])?;

    let ids = as_text(projected.column(0))?;
    let ids = ids
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| CleanError::MissingColumn(id_column.to_string()))?;
    let failing: BooleanArray = ids
        .iter()
        .map(|id| Some(id.map_or(true, |s| !s.starts_with(prefix))))
        .collect();
    let failing = filter_record_batch(&projected, &failing)?;

    let deduped = dedupe_rows(&failing)?;
    debug!(
        candidates = table.num_rows(),
        bad = deduped.num_rows(),
        "extracted bad records"
    );
    Ok(deduped)
}

/// Remove exact duplicate rows, keeping the first of each.
pub fn dedupe_rows(batch: &RecordBatch) -> Result<RecordBatch> {
    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| SortField::new(f.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields)?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen = HashSet::with_capacity(rows.num_rows());
    let keep: Vec<u32> = (0..rows.num_rows())
        .filter(|&i| seen.insert(rows.row(i).owned()))
        .map(|i| i as u32)
        .collect();
    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }
    take_record_batch(batch, &UInt32Array::from(keep)).map_err(Into::into)
}

fn as_text(col: &ArrayRef) -> Result<ArrayRef> {
    if col.data_type() == &DataType::Utf8 {
        Ok(col.clone())
    } else {
        Ok(cast(col, &DataType::Utf8)?)
    }
}
