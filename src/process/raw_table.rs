use arrow::{
    datatypes::{Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use std::{collections::HashSet, path::PathBuf, sync::Arc};

use crate::{
    config::{ColumnType, DtypeMap},
    error::{CleanError, Result},
    process::convert::build_column,
};

/// One report file after decoding, before any typing.
#[derive(Debug)]
pub struct RawTable {
    /// File the table was read from, for error messages.
    pub path: PathBuf,
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Each data row; `None` is a missing cell.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Remove the trailing row (exporter summary lines).
    pub fn drop_last_row(&mut self) {
        self.rows.pop();
    }

    /// Type every column by `dtypes` (undeclared columns stay text).
    pub fn into_batch(self, dtypes: &DtypeMap) -> Result<RecordBatch> {
        let unique = {
            let mut seen = HashSet::with_capacity(self.headers.len());
            self.headers.iter().all(|h| seen.insert(h.as_str()))
        };
        if !unique {
            let mut expected: Vec<String> = Vec::new();
            for h in &self.headers {
                if !expected.contains(h) {
                    expected.push(h.clone());
                }
            }
            return Err(CleanError::SchemaMismatch {
                path: self.path,
                expected,
                found: self.headers,
            });
        }

        let mut fields = Vec::with_capacity(self.headers.len());
        let mut columns = Vec::with_capacity(self.headers.len());
        for (idx, name) in self.headers.iter().enumerate() {
            let ty = dtypes.get(name).copied().unwrap_or(ColumnType::Text);
            let cells = self
                .rows
                .iter()
                .map(|row| row.get(idx).and_then(|c| c.as_deref()));
            columns.push(build_column(name, ty, cells)?);
            fields.push(Field::new(name, ty.arrow_type(), true));
        }

        let options = RecordBatchOptions::new().with_row_count(Some(self.rows.len()));
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::DataType;

    fn raw(headers: &[&str], rows: &[&[Option<&str>]]) -> RawTable {
        RawTable {
            path: PathBuf::from("report.csv"),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[test]
    fn declared_and_undeclared_columns() {
        let mut dtypes = DtypeMap::new();
        dtypes.insert("streams_downloads".into(), ColumnType::NullableInt);
        let t = raw(
            &["ISRC", "streams_downloads"],
            &[&[Some("AAA11000001"), Some("12")], &[Some("BBB22000001"), None]],
        );
        let batch = t.into_batch(&dtypes).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        let streams = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(streams.value(0), 12);
        assert!(streams.is_null(1));
        let isrc = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(isrc.value(1), "BBB22000001");
    }

    #[test]
    fn short_rows_read_as_missing() {
        let t = raw(&["a", "b"], &[&[Some("x")]]);
        let batch = t.into_batch(&DtypeMap::new()).unwrap();
        assert!(batch.column(1).is_null(0));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let t = raw(&["ISRC", "ISRC"], &[]);
        assert!(matches!(
            t.into_batch(&DtypeMap::new()),
            Err(CleanError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn drop_last_row_on_empty_is_noop() {
        let mut t = raw(&["a"], &[]);
        t.drop_last_row();
        assert!(t.rows.is_empty());
        let mut t = raw(&["a"], &[&[Some("1")], &[Some("total")]]);
        t.drop_last_row();
        assert_eq!(t.rows.len(), 1);
    }
}
