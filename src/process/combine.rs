use arrow::{compute::concat_batches, record_batch::RecordBatch};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    config::DtypeMap,
    error::{CleanError, Result},
    process::{read::read_report, utils::resolve_encoding},
};

/// The concatenated table plus the files that contributed to it.
#[derive(Debug)]
pub struct CombinedFiles {
    pub table: RecordBatch,
    pub inputs: Vec<PathBuf>,
}

/// Read every supported file in `paths` and stack them in order.
///
/// Returns `None` when every path had an unsupported extension.
#[tracing::instrument(level = "info", skip(paths, dtypes), fields(files = paths.len()))]
pub fn combine_files(
    paths: &[PathBuf],
    encoding: &str,
    dtypes: &DtypeMap,
) -> Result<Option<CombinedFiles>> {
    let codec = resolve_encoding(encoding)?;
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        info!("reading file: {}", path.display());
        if let Some(raw) = read_report(path, codec)? {
            tables.push((path.clone(), raw.into_batch(dtypes)?));
        }
    }

    let inputs: Vec<PathBuf> = tables.iter().map(|(p, _)| p.clone()).collect();
    Ok(concat_tables(tables)?.map(|table| CombinedFiles { table, inputs }))
}

/// Stack tables in order. Column order follows the first table; later
/// tables must have the same column set and are reordered to match.
pub fn concat_tables(tables: Vec<(PathBuf, RecordBatch)>) -> Result<Option<RecordBatch>> {
    let mut iter = tables.into_iter();
    let first = match iter.next() {
        Some((_, batch)) => batch,
        None => return Ok(None),
    };
    let schema = first.schema();
    let expected = column_names(&first);

    let mut aligned = vec![first];
    for (path, batch) in iter {
        aligned.push(align_columns(&path, batch, &expected)?);
    }

    let combined = concat_batches(&schema, &aligned)?;
    info!(rows = combined.num_rows(), "combined tables");
    Ok(Some(combined))
}

fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

fn align_columns(path: &Path, batch: RecordBatch, expected: &[String]) -> Result<RecordBatch> {
    let found = column_names(&batch);
    let mismatch = || CleanError::SchemaMismatch {
        path: path.to_path_buf(),
        expected: expected.to_vec(),
        found: found.clone(),
    };
    if found.len() != expected.len() {
        return Err(mismatch());
    }
    if found == expected {
        return Ok(batch);
    }

    let mut indices = Vec::with_capacity(expected.len());
    for name in expected {
        let idx = found.iter().position(|f| f == name).ok_or_else(mismatch)?;
        indices.push(idx);
    }
    batch.project(&indices).map_err(Into::into)
}
