//! Scalar values bound as query parameters or read back from result rows.

use serde::{Deserialize, Serialize};

/// A scalar SQL value.
///
/// Used both for bound parameters (always passed to the execution layer as
/// parameters, never interpolated) and for values decoded out of result rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of this value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Decode a JSON value produced by the execution layer.
    ///
    /// Rows come back as JSON objects; nested arrays or objects have no
    /// scalar meaning and are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, crate::error::ExecutionError> {
        use serde_json::Value;
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(crate::error::ExecutionError::malformed_row(format!(
                        "non-finite number: {n}"
                    )))
                }
            }
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(crate::error::ExecutionError::malformed_row(format!(
                "expected scalar, got {other}"
            ))),
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
