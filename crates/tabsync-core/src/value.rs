//! Cell values.
//!
//! Every cell of a [`Dataset`](crate::Dataset) is a [`SqlValue`]. Values are
//! always sent to the database as bound parameters, never inlined into SQL.

use std::fmt;

use chrono::NaiveDateTime;

/// Formats accepted for timestamps carried as text.
pub(crate) const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Format used when rendering a timestamp as text.
const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A SQL value that can be bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Date and time without time zone.
    Timestamp(NaiveDateTime),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Blob(_) => "blob",
        }
    }

    /// Renders the value as text for storage in a text column.
    ///
    /// Returns `None` for NULL and for blobs, which have no text form.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::Blob(_) => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Timestamp(ts) => Some(ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string()),
        }
    }

    /// Parses an ISO 8601 date-time without offset.
    #[must_use]
    pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
            other => f.write_str(&other.to_text().unwrap_or_default()),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> Self {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl From<serde_json::Value> for SqlValue {
    /// Nested arrays and objects keep their JSON text.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Text(n.to_string())),
            serde_json::Value::String(s) => Self::Text(s),
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Text(nested.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text() {
        assert_eq!(SqlValue::Int(42).to_text().as_deref(), Some("42"));
        assert_eq!(SqlValue::Bool(true).to_text().as_deref(), Some("true"));
        assert_eq!(SqlValue::Float(2.5).to_text().as_deref(), Some("2.5"));
        assert_eq!(SqlValue::Null.to_text(), None);
        assert_eq!(SqlValue::Blob(vec![1, 2]).to_text(), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = SqlValue::parse_timestamp("2024-03-01T10:15:00").unwrap();
        assert_eq!(ts.to_string(), "2024-03-01 10:15:00");
        assert!(SqlValue::parse_timestamp("2024-03-01 10:15:00.250").is_some());
        assert!(SqlValue::parse_timestamp("2024-03-01").is_none());
        assert!(SqlValue::parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_timestamp_to_text() {
        let ts = SqlValue::parse_timestamp("2024-03-01 10:15:00").unwrap();
        assert_eq!(
            SqlValue::Timestamp(ts).to_text().as_deref(),
            Some("2024-03-01 10:15:00")
        );
    }

    #[test]
    fn test_from_json() {
        assert_eq!(SqlValue::from(serde_json::json!(7)), SqlValue::Int(7));
        assert_eq!(SqlValue::from(serde_json::json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(SqlValue::from(serde_json::json!(null)), SqlValue::Null);
        assert_eq!(
            SqlValue::from(serde_json::json!([1, 2])),
            SqlValue::Text(String::from("[1,2]"))
        );
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!("hello".to_sql_value(), SqlValue::Text(String::from("hello")));
        assert_eq!(None::<i64>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(3_i64).to_sql_value(), SqlValue::Int(3));
    }
}
