use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray},
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use std::sync::Arc;

use crate::{
    config::DtypeMap,
    error::{CleanError, Result},
    process::convert::parse_float,
};

pub const DATE_COLUMN: &str = "date";

/// Put `column` into the batch: replaced in place if the name exists,
/// appended at the end otherwise.
pub fn set_column(batch: &RecordBatch, name: &str, column: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let field = Field::new(name, column.data_type().clone(), true);
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = batch.columns().to_vec();

    match schema.index_of(name) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = column;
        }
        Err(_) => {
            fields.push(field);
            columns.push(column);
        }
    }

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)
        .map_err(Into::into)
}

/// Stamp every row with the report date, as the single `date` column.
pub fn stamp_date(batch: &RecordBatch, iso_date: &str) -> Result<RecordBatch> {
    let dates = StringArray::from(vec![iso_date; batch.num_rows()]);
    set_column(batch, DATE_COLUMN, Arc::new(dates))
}

/// Replace the literal `marker` with null in each named text column.
/// Non-text columns cannot hold the marker and are left as they are.
pub fn replace_with_null(
    batch: &RecordBatch,
    columns: &[String],
    marker: &str,
) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for name in columns {
        let col = out
            .column_by_name(name)
            .ok_or_else(|| CleanError::MissingColumn(name.clone()))?
            .clone();
        let Some(text) = col.as_any().downcast_ref::<StringArray>() else {
            continue;
        };
        let replaced: StringArray = text
            .iter()
            .map(|v| v.filter(|s| *s != marker))
            .collect();
        out = set_column(&out, name, Arc::new(replaced))?;
    }
    Ok(out)
}

/// Row-wise sum of `inputs` into a Float64 `output` column.
///
/// A missing input counts as zero only when `dtypes` declares the column
/// nullable-numeric; anything else missing is a coercion error.
pub fn add_total(
    batch: &RecordBatch,
    output: &str,
    inputs: &[String],
    dtypes: &DtypeMap,
) -> Result<RecordBatch> {
    let mut totals = vec![0.0_f64; batch.num_rows()];
    for name in inputs {
        let nullable = dtypes
            .get(name)
            .is_some_and(|ty| ty.is_nullable_numeric());
        for (row, value) in numeric_values(batch, name)?.into_iter().enumerate() {
            totals[row] += match value {
                Some(v) => v,
                None if nullable => 0.0,
                None => {
                    return Err(CleanError::TypeCoercion {
                        column: name.clone(),
                        row,
                        value: None,
                        expected: "number".into(),
                    })
                }
            };
        }
    }
    set_column(batch, output, Arc::new(Float64Array::from(totals)))
}

fn numeric_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<f64>>> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| CleanError::MissingColumn(name.to_string()))?;

    if let Some(text) = col.as_any().downcast_ref::<StringArray>() {
        return text
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                None => Ok(None),
                Some(s) => parse_float(s).map(Some).ok_or_else(|| CleanError::TypeCoercion {
                    column: name.to_string(),
                    row,
                    value: Some(s.to_string()),
                    expected: "number".into(),
                }),
            })
            .collect();
    }

    if !col.data_type().is_numeric() {
        return Err(CleanError::TypeCoercion {
            column: name.to_string(),
            row: 0,
            value: None,
            expected: format!("number, column is {}", col.data_type()),
        });
    }
    let floats = cast(col, &DataType::Float64)?;
    let floats = floats
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| CleanError::MissingColumn(name.to_string()))?;
    Ok(floats.iter().collect())
}
