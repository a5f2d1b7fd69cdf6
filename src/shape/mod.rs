//! Result shaper: fold ordered flat rows into stratified series and merge in
//! denominator totals.
//!
//! The fold relies on the ORDER BY the planner emitted (stratifier, then x).
//! Rows are processed in a single pass and never re-sorted here; an execution
//! layer that breaks the ordering breaks the shaper.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ExecutionError;
use crate::plan::AggregationPlan;
use crate::sql::Scalar;

/// A raw result row as returned by the execution layer.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A decoded row of the primary aggregation query.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryRow {
    pub stratifier: Option<Scalar>,
    pub x: Scalar,
    pub y: Scalar,
    pub y_min: Option<Scalar>,
    pub y_max: Option<Scalar>,
}

/// A decoded row of the denominator query.
///
/// The field is named `stratifier` because that is the alias the query
/// selects, but it carries the x-axis category value: the denominator reads
/// the unstratified rollup. Callers consume it as a per-category total.
#[derive(Debug, Clone, PartialEq)]
pub struct DenominatorRow {
    pub stratifier: Scalar,
    pub total: Scalar,
}

/// One charted series: an optional stratum label plus `[x, y]` or
/// `[x, y, yMin, yMax]` points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stratifier: Option<Scalar>,
    pub rows: Vec<Vec<Scalar>>,
}

/// The aggregation response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResponse {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stratifier: Option<String>,
    pub filters: Vec<String>,
    pub total_count: i64,
    pub row_count: usize,
    /// Per-category totals from the denominator query, keyed by the category
    /// value. Only present when a stratifier was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<String, i64>>,
    pub data: Vec<Series>,
}

/// Decode the primary query's JSON rows.
///
/// Measure fields (`y`, `y_min`, `y_max`) must be numeric; a row whose
/// measure cannot be read as a number is rejected rather than folded into
/// the totals as zero.
pub fn decode_primary_rows(rows: &[Row]) -> Result<Vec<PrimaryRow>, ExecutionError> {
    rows.iter()
        .map(|row| {
            Ok(PrimaryRow {
                stratifier: optional_field(row, "stratifier")?,
                x: required_field(row, "x")?,
                y: numeric_field(row, "y")?,
                y_min: optional_numeric_field(row, "y_min")?,
                y_max: optional_numeric_field(row, "y_max")?,
            })
        })
        .collect()
}

/// Decode the denominator query's JSON rows. `total` must be numeric.
pub fn decode_denominator_rows(rows: &[Row]) -> Result<Vec<DenominatorRow>, ExecutionError> {
    rows.iter()
        .map(|row| {
            Ok(DenominatorRow {
                stratifier: required_field(row, "stratifier")?,
                total: numeric_field(row, "total")?,
            })
        })
        .collect()
}

fn required_field(row: &Row, name: &str) -> Result<Scalar, ExecutionError> {
    let value = row
        .get(name)
        .ok_or_else(|| ExecutionError::malformed_row(format!("missing field '{name}'")))?;
    Scalar::from_json(value)
}

fn optional_field(row: &Row, name: &str) -> Result<Option<Scalar>, ExecutionError> {
    match row.get(name) {
        None => Ok(None),
        Some(serde_json::Value::Null) => Ok(None),
        Some(value) => Scalar::from_json(value).map(Some),
    }
}

fn numeric_field(row: &Row, name: &str) -> Result<Scalar, ExecutionError> {
    coerce_numeric(required_field(row, name)?, name)
}

fn optional_numeric_field(row: &Row, name: &str) -> Result<Option<Scalar>, ExecutionError> {
    optional_field(row, name)?
        .map(|value| coerce_numeric(value, name))
        .transpose()
}

/// Some drivers hand numeric aggregates back as JSON strings; accept those,
/// reject anything else non-numeric.
fn coerce_numeric(value: Scalar, field: &str) -> Result<Scalar, ExecutionError> {
    match value {
        Scalar::Int(_) | Scalar::Float(_) => Ok(value),
        Scalar::Text(ref text) => {
            if let Ok(int) = text.parse::<i64>() {
                Ok(Scalar::Int(int))
            } else if let Ok(float) = text.parse::<f64>() {
                Ok(Scalar::Float(float))
            } else {
                Err(ExecutionError::malformed_row(format!(
                    "field '{field}' is not numeric: '{text}'"
                )))
            }
        }
        other => Err(ExecutionError::malformed_row(format!(
            "field '{field}' is not numeric: {other:?}"
        ))),
    }
}

/// Fold ordered primary rows into series, one new series per stratifier-value
/// change, and merge denominator totals into the `counts` map.
pub fn shape(
    plan: &AggregationPlan,
    primary: Vec<PrimaryRow>,
    denominator: Option<Vec<DenominatorRow>>,
) -> AggregationResponse {
    let row_count = primary.len();
    let mut total_count: i64 = 0;
    let mut data: Vec<Series> = Vec::new();

    for row in primary {
        // y is numeric, enforced by decode_primary_rows.
        total_count += row.y.as_f64().unwrap_or(0.0) as i64;

        let open_matches = data
            .last()
            .is_some_and(|series| series.stratifier == row.stratifier);
        if !open_matches {
            data.push(Series {
                stratifier: row.stratifier.clone(),
                rows: Vec::new(),
            });
        }

        let mut point = vec![row.x, row.y];
        if plan.has_error_bounds {
            if let (Some(min), Some(max)) = (row.y_min, row.y_max) {
                point.push(min);
                point.push(max);
            }
        }
        data.last_mut().expect("series opened above").rows.push(point);
    }

    let counts = denominator.map(|rows| {
        rows.into_iter()
            .map(|row| {
                // total is numeric, enforced by decode_denominator_rows.
                let total = row.total.as_f64().unwrap_or(0.0) as i64;
                (category_key(&row.stratifier), total)
            })
            .collect()
    });

    AggregationResponse {
        column: plan.column.clone(),
        stratifier: plan.stratifier.clone(),
        filters: plan.filters.clone(),
        total_count,
        row_count,
        counts,
        data,
    }
}

/// Render a scalar as a `counts` map key.
fn category_key(value: &Scalar) -> String {
    match value {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Text(s) => s.clone(),
    }
}
