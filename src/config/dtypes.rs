// src/config/dtypes.rs

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::error::CleanError;

/// Declared type of a report column.
///
/// Names follow the labels report owners already write in the pipeline file:
/// - `str`, `string`, `object`   → Text
/// - `int64`, `int`              → Int (a missing cell is an error)
/// - `Int64`                     → NullableInt
/// - `float64`, `float`          → Float
/// - `Float64`                   → NullableFloat
/// - `bool`, `boolean`           → Bool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Text,
    Int,
    NullableInt,
    Float,
    NullableFloat,
    Bool,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "str",
            ColumnType::Int => "int64",
            ColumnType::NullableInt => "Int64",
            ColumnType::Float => "float64",
            ColumnType::NullableFloat => "Float64",
            ColumnType::Bool => "bool",
        }
    }

    /// Arrow type the column is materialized as. Every field is nullable at
    /// the arrow level; `Int` rejects missing cells while reading instead.
    pub fn arrow_type(&self) -> DataType {
        match self {
            ColumnType::Text => DataType::Utf8,
            ColumnType::Int | ColumnType::NullableInt => DataType::Int64,
            ColumnType::Float | ColumnType::NullableFloat => DataType::Float64,
            ColumnType::Bool => DataType::Boolean,
        }
    }

    /// Whether a missing value may stand in for zero in numeric rules.
    pub fn is_nullable_numeric(&self) -> bool {
        matches!(self, ColumnType::NullableInt | ColumnType::NullableFloat)
    }
}

impl FromStr for ColumnType {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // case matters: pandas-style `Int64` is the nullable integer
        match s.trim() {
            "str" | "string" | "object" => Ok(ColumnType::Text),
            "int64" | "int" => Ok(ColumnType::Int),
            "Int64" => Ok(ColumnType::NullableInt),
            "float64" | "float" => Ok(ColumnType::Float),
            "Float64" => Ok(ColumnType::NullableFloat),
            "bool" | "boolean" => Ok(ColumnType::Bool),
            other => Err(CleanError::UnknownColumnType(other.to_string())),
        }
    }
}

impl TryFrom<String> for ColumnType {
    type Error = CleanError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column name → declared type.
pub type DtypeMap = BTreeMap<String, ColumnType>;
