//! Decoded column values and result rows.
//!
//! The driver layer hands the mapper registry rows whose columns are already
//! decoded into `SqlValue`. Mappers read from a `ResultRow`; a `ResultSet`
//! bundles column labels and rows, and can be loaded from YAML fixtures.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// A single decoded column value as produced by the driver.
///
/// Deserialization is untagged, so fixture files can write plain scalars;
/// integers land in the narrowest integer variant, floats in `Float64` and
/// text stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL
    Null,

    /// Boolean value
    Bool(bool),

    /// 16-bit signed integer
    Int16(i16),

    /// 32-bit signed integer
    Int32(i32),

    /// 64-bit signed integer
    Int64(i64),

    /// 64-bit floating point
    Float64(f64),

    /// Text value
    Text(String),

    /// Array of values
    Array(Vec<SqlValue>),

    /// 32-bit floating point
    #[serde(skip_deserializing)]
    Float32(f32),

    /// Decimal value kept in its exact textual form
    #[serde(skip_deserializing)]
    Decimal(String),

    /// Binary data
    #[serde(skip_deserializing)]
    Bytes(Vec<u8>),

    /// UUID value
    #[serde(skip_deserializing)]
    Uuid(Uuid),

    /// Date only
    #[serde(skip_deserializing)]
    Date(NaiveDate),

    /// Time only
    #[serde(skip_deserializing)]
    Time(NaiveTime),

    /// Timestamp without timezone
    #[serde(skip_deserializing)]
    LocalDateTime(NaiveDateTime),

    /// Timestamp with timezone
    #[serde(skip_deserializing)]
    ZonedDateTime(DateTime<Utc>),

    /// JSON document
    #[serde(skip_deserializing)]
    Json(serde_json::Value),
}

impl SqlValue {
    /// Create a new decimal value.
    pub fn decimal(value: impl Into<String>) -> Self {
        Self::Decimal(value.into())
    }

    /// Create a new text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value's variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int16(_) => "small_int",
            Self::Int32(_) => "int",
            Self::Int64(_) => "big_int",
            Self::Float32(_) => "float",
            Self::Float64(_) => "double",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
            Self::Decimal(_) => "decimal",
            Self::Bytes(_) => "bytes",
            Self::Uuid(_) => "uuid",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::LocalDateTime(_) => "date_time",
            Self::ZonedDateTime(_) => "timestamp_tz",
            Self::Json(_) => "json",
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an i64, widening smaller integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int16(i) => Some(i64::from(*i)),
            Self::Int32(i) => Some(i64::from(*i)),
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64, widening floats and integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(f) => Some(f64::from(*f)),
            Self::Float64(f) => Some(*f),
            Self::Int16(i) => Some(f64::from(*i)),
            Self::Int32(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Decimal(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an array.
    pub fn as_array(&self) -> Option<&[SqlValue]> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

/// One row of a result cursor.
///
/// Column labels are shared between all rows of the same result, so cloning a
/// row or producing the next one does not copy them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Position of the row within its result (0-based)
    pub index: u64,

    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl ResultRow {
    /// Create a new row from shared column labels and its values.
    pub fn new(index: u64, columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self {
            index,
            columns,
            values,
        }
    }

    /// Create a new row with a builder pattern.
    pub fn builder(index: u64) -> ResultRowBuilder {
        ResultRowBuilder {
            index,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get a column value by position (0-based).
    pub fn get(&self, column: usize) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// Get a column value by label.
    pub fn get_by_name(&self, name: &str) -> Option<&SqlValue> {
        self.column_index(name).and_then(|i| self.values.get(i))
    }

    /// Position of the column with the given label, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Label of the column at the given position.
    pub fn column_name(&self, column: usize) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// All column labels, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All values, in column order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of columns in the row.
    pub fn column_count(&self) -> usize {
        self.values.len()
    }
}

/// Builder for `ResultRow`.
pub struct ResultRowBuilder {
    index: u64,
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl ResultRowBuilder {
    /// Append a column to the row.
    pub fn column(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        self.columns.push(name.into());
        self.values.push(value);
        self
    }

    /// Build the row.
    pub fn build(self) -> ResultRow {
        ResultRow::new(self.index, self.columns.into(), self.values)
    }
}

/// Error type for result set loading.
#[derive(Debug, thiserror::Error)]
pub enum ResultSetError {
    /// Error reading the result file
    #[error("Failed to read result file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A row does not have one value per column
    #[error("Row {row} has {actual} values, expected {expected}")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// A fully materialized result: column labels and decoded rows.
///
/// # YAML Format
///
/// ```yaml
/// columns: [id, name, tags]
/// rows:
///   - [1, Alice, [admin, ops]]
///   - [2, Bob, []]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column labels
    pub columns: Vec<String>,

    /// Row values, one entry per column
    #[serde(default)]
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    /// Parse a result set from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ResultSetError> {
        let set: Self = serde_yaml::from_str(yaml)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a result set from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResultSetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    fn validate(&self) -> Result<(), ResultSetError> {
        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != self.columns.len() {
                return Err(ResultSetError::ColumnCountMismatch {
                    row,
                    expected: self.columns.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the rows as `ResultRow`s sharing one set of column labels.
    pub fn rows(&self) -> impl Iterator<Item = ResultRow> + '_ {
        let columns: Arc<[String]> = self.columns.clone().into();
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, values)| ResultRow::new(i as u64, columns.clone(), values.clone()))
    }
}
