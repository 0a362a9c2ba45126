use super::naming::SemanticPrefixes;
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest `VARCHAR2` width before a column becomes a `CLOB`.
pub const VARCHAR2_MAX_LEN: usize = 4000;

/// Width used for text columns where every value is empty.
pub const DEFAULT_VARCHAR2_LEN: usize = 255;

/// What the values of a column look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueShape {
    Integer,
    Float,
    DateTime,
    Boolean,
    Text,
}

impl ValueShape {
    /// Shape of a column that has already been typed by the CSV reader.
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_bool() {
            Self::Boolean
        } else if dtype.is_integer() {
            Self::Integer
        } else if dtype.is_float() {
            Self::Float
        } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
            Self::DateTime
        } else {
            Self::Text
        }
    }

    /// The naming and typing policy for this shape.
    ///
    /// Integer and float columns both map to `NUMBER` without
    /// precision or scale.
    pub const fn policy(self) -> ShapePolicy {
        match self {
            Self::Integer | Self::Float => ShapePolicy {
                prefix: PrefixRule::Numeric,
                column_type: TypeRule::Number,
            },
            Self::DateTime => ShapePolicy {
                prefix: PrefixRule::Date,
                column_type: TypeRule::Date,
            },
            Self::Boolean => ShapePolicy {
                prefix: PrefixRule::Flag,
                column_type: TypeRule::Flag,
            },
            Self::Text => ShapePolicy {
                prefix: PrefixRule::CodeOrName,
                column_type: TypeRule::SizedText,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
            Self::Text => "text",
        }
    }
}

/// One row of the shape policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapePolicy {
    pub prefix: PrefixRule,
    pub column_type: TypeRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRule {
    Numeric,
    Date,
    Flag,
    /// Code prefix when any value contains a digit, name prefix otherwise
    CodeOrName,
}

impl PrefixRule {
    pub fn resolve<'a>(&self, prefixes: &'a SemanticPrefixes, has_digits: bool) -> &'a str {
        match self {
            Self::Numeric => prefixes.numeric.as_str(),
            Self::Date => prefixes.date.as_str(),
            Self::Flag => prefixes.flag.as_str(),
            Self::CodeOrName if has_digits => prefixes.code.as_str(),
            Self::CodeOrName => prefixes.name.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule {
    Number,
    Date,
    Flag,
    /// `VARCHAR2` sized to the longest value, `CLOB` past the `VARCHAR2` limit
    SizedText,
}

impl TypeRule {
    pub fn resolve(&self, max_text_len: usize) -> OracleType {
        match self {
            Self::Number => OracleType::Number,
            Self::Date => OracleType::Date,
            Self::Flag => OracleType::Flag,
            Self::SizedText if max_text_len > VARCHAR2_MAX_LEN => OracleType::Clob,
            Self::SizedText if max_text_len == 0 => OracleType::Varchar2(DEFAULT_VARCHAR2_LEN),
            Self::SizedText => OracleType::Varchar2(max_text_len),
        }
    }
}

/// Oracle column type emitted in the CREATE TABLE script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleType {
    Number,
    Date,
    /// `NUMBER(1)` holding 1/0
    Flag,
    Varchar2(usize),
    Clob,
}

impl fmt::Display for OracleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "NUMBER"),
            Self::Date => write!(f, "DATE"),
            Self::Flag => write!(f, "NUMBER(1)"),
            Self::Varchar2(len) => write!(f, "VARCHAR2({len})"),
            Self::Clob => write!(f, "CLOB"),
        }
    }
}

/// Final identifier and type chosen for one input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDecision {
    /// Cleaned, deduplicated header the decision was made from
    pub source_name: String,
    pub identifier: String,
    pub column_type: OracleType,
    pub shape: ValueShape,
}

impl ColumnDecision {
    /// Column definition line for CREATE TABLE, e.g. `"NU_IDADE" NUMBER`.
    pub fn ddl(&self) -> String {
        format!("\"{}\" {}", self.identifier, self.column_type)
    }
}

/// Table name plus its columns, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDecision>,
}

impl TableSchema {
    pub fn quoted_name(&self) -> String {
        format!("\"{}\"", self.name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.identifier.as_str())
    }
}
