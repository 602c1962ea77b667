use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be bound as parameters or read back from a row.
///
/// ```rust
/// use sql_middleware_oracle::prelude::*;
///
/// let params = Params::positional(vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
/// ]);
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Oracle has no boolean column type; catalog views use `Y`/`N` and `1`/`0`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(value) => Some(*value),
            RowValues::Int(1) => Some(true),
            RowValues::Int(0) => Some(false),
            RowValues::Text(s) if s.eq_ignore_ascii_case("y") => Some(true),
            RowValues::Text(s) if s.eq_ignore_ascii_case("n") => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Declared type of an output bind.
///
/// The discriminants are the native driver's type constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindType {
    String = 2001,
    Number = 2002,
    Date = 2003,
    Buffer = 2005,
    Clob = 2006,
    Blob = 2007,
}

impl BindType {
    /// Resolve a returning-field type name (`string`, `number`, ...).
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(BindType::String),
            "number" => Some(BindType::Number),
            "date" => Some(BindType::Date),
            "blob" => Some(BindType::Blob),
            "clob" => Some(BindType::Clob),
            "buffer" => Some(BindType::Buffer),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// One bind slot.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    /// Input value.
    In(RowValues),
    /// Output placeholder filled by the server (`RETURNING ... INTO`).
    /// `bind_type` of `None` leaves the type to the native driver.
    Out {
        name: String,
        bind_type: Option<BindType>,
    },
}

impl From<RowValues> for BindValue {
    fn from(value: RowValues) -> Self {
        BindValue::In(value)
    }
}

/// Statement parameters: positional or named, never both in one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<BindValue>),
    Named(Vec<(String, BindValue)>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl Params {
    #[must_use]
    pub fn positional(values: Vec<RowValues>) -> Self {
        Params::Positional(values.into_iter().map(BindValue::In).collect())
    }

    #[must_use]
    pub fn named<K: Into<String>>(values: impl IntoIterator<Item = (K, RowValues)>) -> Self {
        Params::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), BindValue::In(v)))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a named bind.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BindValue> {
        match self {
            Params::Positional(_) => None,
            Params::Named(values) => values.iter().find(|(k, _)| k == name).map(|(_, v)| v),
        }
    }
}

/// A value read back from an output bind.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    Scalar(RowValues),
    List(Vec<RowValues>),
}

impl ReturnValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&RowValues> {
        if let ReturnValue::Scalar(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[RowValues]> {
        if let ReturnValue::List(values) = self {
            Some(values)
        } else {
            None
        }
    }
}
