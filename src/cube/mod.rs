//! Cube table metadata: column descriptors, schema lookup, and the
//! identifier trust boundary.
//!
//! A cube table is a sparse, pre-aggregated rollup: each row carries values
//! for exactly the dimension columns it was grouped by and NULL everywhere
//! else. The measure columns (`cnt`, `cnt_min`, `cnt_max`) are reserved and
//! never usable as dimensions.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The aggregate count column present in every cube table.
pub const MEASURE_COUNT: &str = "cnt";

/// Lower confidence-interval bound column (optional per cube).
pub const MEASURE_COUNT_MIN: &str = "cnt_min";

/// Upper confidence-interval bound column (optional per cube).
pub const MEASURE_COUNT_MAX: &str = "cnt_max";

/// All reserved measure column names.
pub const MEASURE_COLUMNS: [&str; 3] = [MEASURE_COUNT, MEASURE_COUNT_MIN, MEASURE_COUNT_MAX];

/// Data type of a cube column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Timestamp,
}

impl DataType {
    /// Whether values of this type carry a date component.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Timestamp)
    }
}

/// A single cube column: name plus data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDescriptor {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Whether this column is one of the reserved measure columns.
    pub fn is_measure(&self) -> bool {
        MEASURE_COLUMNS.contains(&self.name.as_str())
    }
}

/// Metadata for one cube table: its name and full column list.
///
/// The schema is resolved by the caller (it owns the relational metadata) and
/// handed to the engine per request. The engine treats it as the single
/// source of truth for which identifiers may appear in generated SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeSchema {
    /// Physical table name.
    pub table: String,

    /// All columns, measures included.
    pub columns: Vec<ColumnDescriptor>,
}

impl CubeSchema {
    pub fn new(table: &str, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Derive the cube table name for a data request id.
    pub fn table_for_request(request_id: i64) -> String {
        format!("cube_{request_id}")
    }

    /// Look up a column descriptor by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The dimension columns: everything that is not a reserved measure.
    pub fn dimension_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.is_measure())
    }

    /// Whether this cube carries confidence-interval bound columns.
    pub fn has_error_bounds(&self) -> bool {
        self.column(MEASURE_COUNT_MIN).is_some() && self.column(MEASURE_COUNT_MAX).is_some()
    }

    /// Validate a caller-supplied identifier against the known columns.
    ///
    /// Column names are interpolated literally into SQL (values never are),
    /// so every identifier must pass through here before it reaches a query
    /// string. Unknown names are rejected, naming the offender.
    pub fn validate_column(&self, name: &str) -> Result<&ColumnDescriptor, ValidationError> {
        self.column(name)
            .ok_or_else(|| ValidationError::UnknownColumn {
                column: name.to_string(),
            })
    }

    /// Like [`validate_column`](Self::validate_column), but additionally
    /// rejects the reserved measure columns. Used for requested dimensions
    /// and filter targets.
    pub fn validate_dimension(&self, name: &str) -> Result<&ColumnDescriptor, ValidationError> {
        let descriptor = self.validate_column(name)?;
        if descriptor.is_measure() {
            return Err(ValidationError::ReservedColumn {
                column: name.to_string(),
            });
        }
        Ok(descriptor)
    }
}
