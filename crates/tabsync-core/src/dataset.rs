//! Typed tabular datasets.
//!
//! A [`Dataset`] is an ordered list of named [`Column`]s of equal length. Each
//! column carries a [`NativeType`] tag that is resolved once, when the column
//! is built, from the values it holds. Everything downstream (type mapping,
//! DDL generation, row binding) reads the tag instead of re-inspecting values.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::DatasetError;
use crate::value::{SqlValue, ToSqlValue};

/// Native type of a column, resolved from its non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeType {
    /// Only integers.
    Integer,
    /// Floats, possibly mixed with integers.
    Float,
    /// Only booleans.
    Boolean,
    /// Only timestamps.
    Timestamp,
    /// Only text.
    Text,
    /// A mix of value kinds that has no common numeric type.
    Object,
    /// Only blobs.
    Binary,
    /// No non-null value to infer from.
    Unknown,
}

impl NativeType {
    /// Infers the native type of a sequence of values, ignoring NULLs.
    #[must_use]
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a SqlValue>) -> Self {
        let mut resolved = Self::Unknown;
        for value in values {
            let current = match value {
                SqlValue::Null => continue,
                SqlValue::Bool(_) => Self::Boolean,
                SqlValue::Int(_) => Self::Integer,
                SqlValue::Float(_) => Self::Float,
                SqlValue::Text(_) => Self::Text,
                SqlValue::Timestamp(_) => Self::Timestamp,
                SqlValue::Blob(_) => Self::Binary,
            };
            resolved = match (resolved, current) {
                (Self::Unknown, next) => next,
                (prev, next) if prev == next => prev,
                (Self::Integer | Self::Float, Self::Integer | Self::Float) => Self::Float,
                _ => return Self::Object,
            };
        }
        resolved
    }

    /// Returns true for text-like columns (`Text` and `Object`).
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Object)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Text => "text",
            Self::Object => "object",
            Self::Binary => "binary",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A named column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    native_type: NativeType,
    values: Vec<SqlValue>,
}

impl Column {
    /// Creates a column, inferring its native type from the values.
    #[must_use]
    pub fn new<V: ToSqlValue>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<SqlValue> = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        let native_type = NativeType::infer(&values);
        Self {
            name: name.into(),
            native_type,
            values,
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native type resolved when the column was built.
    #[must_use]
    pub const fn native_type(&self) -> NativeType {
        self.native_type
    }

    /// Values in row order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts an all-text column whose values all parse as timestamps.
    fn resolve_timestamps(self) -> Self {
        if self.native_type != NativeType::Text {
            return self;
        }
        let parsed: Option<Vec<SqlValue>> = self
            .values
            .iter()
            .map(|value| match value {
                SqlValue::Text(text) => SqlValue::parse_timestamp(text).map(SqlValue::Timestamp),
                other => Some(other.clone()),
            })
            .collect();
        match parsed {
            Some(values) => Self {
                name: self.name,
                native_type: NativeType::Timestamp,
                values,
            },
            None => self,
        }
    }
}

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Builds a dataset, checking that names are unique and lengths agree.
    ///
    /// # Errors
    ///
    /// Returns a `DatasetError` if two columns share a name or their lengths
    /// differ.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }

        let row_count = columns.first().map_or(0, Column::len);
        if let Some(column) = columns.iter().find(|c| c.len() != row_count) {
            return Err(DatasetError::LengthMismatch {
                column: column.name.clone(),
                expected: row_count,
                found: column.len(),
            });
        }

        Ok(Self { columns, row_count })
    }

    /// Builds a dataset from a JSON array of records.
    ///
    /// Columns appear in first-seen key order. Keys missing from a record
    /// become NULL. Text columns made entirely of ISO 8601 date-times are
    /// resolved to [`NativeType::Timestamp`].
    ///
    /// # Errors
    ///
    /// Returns a `DatasetError` if the input is not a JSON array of objects.
    pub fn from_json_records(json: &str) -> Result<Self, DatasetError> {
        let parsed: JsonValue = serde_json::from_str(json)?;
        let JsonValue::Array(records) = parsed else {
            return Err(DatasetError::NotRecords(String::from(
                "expected a JSON array of objects",
            )));
        };

        let mut names: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let JsonValue::Object(object) = record else {
                return Err(DatasetError::NotRecords(format!(
                    "record {index} is not a JSON object"
                )));
            };
            for key in object.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
            objects.push(object);
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values: Vec<SqlValue> = objects
                    .iter_mut()
                    .map(|object| object.remove(&name).map_or(SqlValue::Null, SqlValue::from))
                    .collect();
                Column::new(name, values).resolve_timestamps()
            })
            .collect();

        Self::new(columns)
    }

    /// Columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks a column up by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of rows.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns true if the dataset has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates rows as value tuples in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&SqlValue>> + '_ {
        (0..self.row_count).map(move |row| self.columns.iter().map(|c| &c.values[row]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_native_types() {
        assert_eq!(NativeType::infer(&[SqlValue::Int(1), SqlValue::Null]), NativeType::Integer);
        assert_eq!(
            NativeType::infer(&[SqlValue::Int(1), SqlValue::Float(2.5)]),
            NativeType::Float
        );
        assert_eq!(
            NativeType::infer(&[SqlValue::Text("a".into()), SqlValue::Int(1)]),
            NativeType::Object
        );
        assert_eq!(NativeType::infer(&[SqlValue::Null, SqlValue::Null]), NativeType::Unknown);
        assert_eq!(NativeType::infer(std::iter::empty()), NativeType::Unknown);
    }

    #[test]
    fn test_column_new() {
        let column = Column::new("name", ["alice", "bob"]);
        assert_eq!(column.name(), "name");
        assert_eq!(column.native_type(), NativeType::Text);
        assert_eq!(column.len(), 2);

        let column = Column::new("score", [Some(1.5), None]);
        assert_eq!(column.native_type(), NativeType::Float);
        assert!(column.values()[1].is_null());
    }

    #[test]
    fn test_dataset_rejects_duplicate_names() {
        let err = Dataset::new(vec![Column::new("id", [1_i64]), Column::new("id", [2_i64])])
            .unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn(name) if name == "id"));
    }

    #[test]
    fn test_dataset_rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::new("id", [1_i64, 2]),
            Column::new("name", ["a"]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::LengthMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_rows() {
        let dataset = Dataset::new(vec![
            Column::new("id", [1_i64, 2]),
            Column::new("name", ["a", "b"]),
        ])
        .unwrap();
        let rows: Vec<_> = dataset.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![&SqlValue::Int(2), &SqlValue::Text("b".into())]);
    }

    #[test]
    fn test_from_json_records() {
        let dataset = Dataset::from_json_records(
            r#"[
                {"id": 1, "ticker": "AAPL", "price": 190.5, "at": "2024-03-01T10:00:00"},
                {"id": 2, "ticker": "GOOGL", "price": 140, "note": "split"}
            ]"#,
        )
        .unwrap();

        let names: Vec<_> = dataset.column_names().collect();
        assert_eq!(names, vec!["id", "ticker", "price", "at", "note"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column("id").unwrap().native_type(), NativeType::Integer);
        assert_eq!(dataset.column("price").unwrap().native_type(), NativeType::Float);
        assert_eq!(dataset.column("at").unwrap().native_type(), NativeType::Timestamp);
        assert_eq!(dataset.column("note").unwrap().native_type(), NativeType::Text);
        assert!(dataset.column("note").unwrap().values()[0].is_null());
    }

    #[test]
    fn test_from_json_keeps_text_when_some_values_are_not_timestamps() {
        let dataset =
            Dataset::from_json_records(r#"[{"at": "2024-03-01 10:00:00"}, {"at": "soon"}]"#)
                .unwrap();
        assert_eq!(dataset.column("at").unwrap().native_type(), NativeType::Text);
    }

    #[test]
    fn test_from_json_rejects_non_records() {
        assert!(matches!(
            Dataset::from_json_records(r#"{"id": 1}"#),
            Err(DatasetError::NotRecords(_))
        ));
        assert!(matches!(
            Dataset::from_json_records("[1, 2]"),
            Err(DatasetError::NotRecords(_))
        ));
        assert!(matches!(
            Dataset::from_json_records("[{"),
            Err(DatasetError::Json(_))
        ));
    }
}
