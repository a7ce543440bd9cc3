//! Workbook fixtures for the spreadsheet reader tests.

use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;

pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

/// Write a single-sheet workbook: `header` in row one, then `rows`.
pub fn write_workbook(
    path: &Path,
    header: &[&str],
    rows: &[Vec<Cell<'_>>],
) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (row, cells) in rows.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(row, col, *s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row, col, *n)?;
                }
                Cell::Blank => {}
            }
        }
    }
    workbook.save(path)
}
