use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use std::sync::Arc;

use crate::{
    config::ColumnType,
    error::{CleanError, Result},
};

/// Build one typed arrow column from optional string cells.
pub fn build_column<'a, I>(name: &str, ty: ColumnType, cells: I) -> Result<ArrayRef>
where
    I: Iterator<Item = Option<&'a str>>,
{
    let coercion = |row: usize, value: Option<&str>| CleanError::TypeCoercion {
        column: name.to_string(),
        row,
        value: value.map(str::to_string),
        expected: ty.to_string(),
    };

    match ty {
        ColumnType::Text => {
            let mut b = StringBuilder::new();
            for cell in cells {
                b.append_option(cell);
            }
            Ok(Arc::new(b.finish()))
        }

        ColumnType::Int | ColumnType::NullableInt => {
            let mut b = Int64Builder::new();
            for (row, cell) in cells.enumerate() {
                match cell {
                    Some(s) => b.append_value(parse_int(s).ok_or_else(|| coercion(row, cell))?),
                    None if ty == ColumnType::NullableInt => b.append_null(),
                    None => return Err(coercion(row, None)),
                }
            }
            Ok(Arc::new(b.finish()))
        }

        ColumnType::Float | ColumnType::NullableFloat => {
            let mut b = Float64Builder::new();
            for (row, cell) in cells.enumerate() {
                match cell {
                    Some(s) => b.append_value(parse_float(s).ok_or_else(|| coercion(row, cell))?),
                    None => b.append_null(),
                }
            }
            Ok(Arc::new(b.finish()))
        }

        ColumnType::Bool => {
            let mut b = BooleanBuilder::new();
            for (row, cell) in cells.enumerate() {
                match cell {
                    Some(s) => b.append_value(parse_bool(s).ok_or_else(|| coercion(row, cell))?),
                    None => b.append_null(),
                }
            }
            Ok(Arc::new(b.finish()))
        }
    }
}

/// Integers, also accepting integral floats such as spreadsheet `12.0`.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}
