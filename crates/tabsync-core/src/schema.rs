//! Storage types and explicit column type mapping.
//!
//! [`get_dtype_mapping`] decides the storage type of every text-like column of
//! a dataset up front, so that text columns get a predictable `NVARCHAR` width
//! instead of whatever the database would infer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::ParseTextLengthError;

/// Width of a bounded text column.
pub const BOUNDED_TEXT_LENGTH: usize = 255;

/// SQL storage types used in generated DDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    BigInt,
    /// Floating point (double precision).
    Float,
    /// Boolean.
    Boolean,
    /// Date and time.
    Timestamp,
    /// Unbounded text.
    Text,
    /// Unicode text with a maximum length; `None` means `MAX`.
    NVarchar(Option<usize>),
    /// Binary large object.
    Blob,
}

impl SqlType {
    /// Returns true for text storage types.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::NVarchar(_))
    }

    /// Maximum length in characters, if the type is bounded text.
    #[must_use]
    pub const fn max_length(&self) -> Option<usize> {
        match self {
            Self::NVarchar(length) => *length,
            _ => None,
        }
    }
}

/// Length policy for text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextLength {
    /// `NVARCHAR(255)`.
    #[default]
    Bounded,
    /// `NVARCHAR(MAX)`.
    Max,
}

impl TextLength {
    /// The storage type this policy assigns to text columns.
    #[must_use]
    pub const fn sql_type(self) -> SqlType {
        match self {
            Self::Bounded => SqlType::NVarchar(Some(BOUNDED_TEXT_LENGTH)),
            Self::Max => SqlType::NVarchar(None),
        }
    }
}

impl FromStr for TextLength {
    type Err = ParseTextLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bounded" | "255" => Ok(Self::Bounded),
            "max" | "unbounded" => Ok(Self::Max),
            _ => Err(ParseTextLengthError(s.to_string())),
        }
    }
}

impl fmt::Display for TextLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded => f.write_str("bounded"),
            Self::Max => f.write_str("max"),
        }
    }
}

/// Explicit storage type per column name.
pub type ColumnTypeMapping = BTreeMap<String, SqlType>;

/// Maps every text-like column of the dataset to an `NVARCHAR` type.
///
/// Columns with another native type are left out and fall back to the
/// dialect's own inference.
#[must_use]
pub fn get_dtype_mapping(dataset: &Dataset, text_length: TextLength) -> ColumnTypeMapping {
    dataset
        .columns()
        .iter()
        .filter(|column| column.native_type().is_textual())
        .map(|column| (column.name().to_string(), text_length.sql_type()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use crate::value::SqlValue;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("id", [1_i64, 2]),
            Column::new("name", ["alice", "bob"]),
            Column::new("score", [1.5, 2.0]),
            Column::new("mixed", [SqlValue::Text("a".into()), SqlValue::Int(3)]),
            Column::new("empty", [SqlValue::Null, SqlValue::Null]),
        ])
        .unwrap()
    }

    #[test]
    fn test_bounded_mapping_covers_text_like_columns() {
        let mapping = get_dtype_mapping(&dataset(), TextLength::Bounded);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["name"], SqlType::NVarchar(Some(255)));
        assert_eq!(mapping["mixed"], SqlType::NVarchar(Some(255)));
        assert!(!mapping.contains_key("id"));
        assert!(!mapping.contains_key("empty"));
    }

    #[test]
    fn test_max_mapping() {
        let mapping = get_dtype_mapping(&dataset(), TextLength::Max);
        assert_eq!(mapping["name"], SqlType::NVarchar(None));
    }

    #[test]
    fn test_parse_text_length() {
        assert_eq!("bounded".parse::<TextLength>().unwrap(), TextLength::Bounded);
        assert_eq!("255".parse::<TextLength>().unwrap(), TextLength::Bounded);
        assert_eq!("MAX".parse::<TextLength>().unwrap(), TextLength::Max);
        assert_eq!("unbounded".parse::<TextLength>().unwrap(), TextLength::Max);
        assert_eq!(
            "128".parse::<TextLength>().unwrap_err(),
            ParseTextLengthError(String::from("128"))
        );
    }

    #[test]
    fn test_max_length() {
        assert_eq!(TextLength::Bounded.sql_type().max_length(), Some(255));
        assert_eq!(TextLength::Max.sql_type().max_length(), None);
        assert!(SqlType::Text.is_text());
        assert!(!SqlType::BigInt.is_text());
    }
}
