use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use encoding_rs::Encoding;
use std::{fs, path::Path};
use tracing::{debug, info};

use crate::{
    error::{CleanError, Result},
    process::{
        raw_table::RawTable,
        utils::{cell_value, clean_str, decode_text},
    },
};

/// Report file formats, inferred from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xls" | "xlsx" => Some(FileFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Read a delimited-text report, decoding it with `encoding` first.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(path = %path.display(), encoding = encoding.name())
)]
pub fn read_csv(path: &Path, encoding: &'static Encoding) -> Result<RawTable> {
    let bytes = fs::read(path).map_err(|source| CleanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(path, &bytes, encoding)?;
    parse_csv_text(path, &text)
}

pub(crate) fn parse_csv_text(path: &Path, text: &str) -> Result<RawTable> {
    let csv_err = |source| CleanError::Csv {
        path: path.to_path_buf(),
        source,
    };
    // short rows (exporter footers) are padded with missing cells later
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(clean_str)
        .collect();
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        if record.len() > headers.len() {
            return Err(CleanError::RowTooLong {
                path: path.to_path_buf(),
                line: record.position().map_or(0, |p| p.line()),
                fields: record.len(),
                expected: headers.len(),
            });
        }
        rows.push(record.iter().map(cell_value).collect());
    }
    debug!(columns = headers.len(), rows = rows.len(), "parsed csv");

    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Read the first worksheet of an `.xls`/`.xlsx` report; row one is the header.
#[tracing::instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_spreadsheet(path: &Path) -> Result<RawTable> {
    let sheet_err = |message: String| CleanError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| sheet_err("workbook has no sheets".into()))?
        .map_err(|e| sheet_err(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(first) => first
            .iter()
            .map(|c| clean_str(&cell_text(c).unwrap_or_default()))
            .collect(),
        None => Vec::new(),
    };
    let rows = sheet_rows
        .map(|r| r.iter().map(cell_text).collect())
        .collect::<Vec<Vec<Option<String>>>>();
    debug!(columns = headers.len(), rows = rows.len(), "parsed sheet");

    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => cell_value(s),
        other => Some(other.to_string()),
    }
}

/// Read `path` by its extension. `None` means the format is not supported
/// and the file was skipped.
pub fn read_report(path: &Path, encoding: &'static Encoding) -> Result<Option<RawTable>> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Csv) => read_csv(path, encoding).map(Some),
        Some(FileFormat::Spreadsheet) => read_spreadsheet(path).map(Some),
        None => {
            info!(path = %path.display(), "unsupported file type, skipping");
            Ok(None)
        }
    }
}
