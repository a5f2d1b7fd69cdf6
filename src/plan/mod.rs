//! Aggregation planner: turn a validated request into the primary cube query
//! and, when a stratifier is in play, the secondary denominator query.
//!
//! The planner leans on the sparsity invariant of cube tables: a row holds
//! non-NULL values for exactly the dimensions it was grouped by. Asserting
//! `IS NULL` on every dimension the request does not use pins the query to
//! the single rollup level that answers it.

use serde::Deserialize;
use tracing::debug;

use crate::cube::{CubeSchema, MEASURE_COUNT, MEASURE_COUNT_MAX, MEASURE_COUNT_MIN};
use crate::error::ValidationError;
use crate::filter::{parse_filters, CompiledFilter};
use crate::sql::{quote_ident, QueryBuilder, SortDir, SqlQuery};

/// An aggregation request as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AggregationRequest {
    /// The x-axis dimension. Required.
    pub column: Option<String>,

    /// Optional secondary dimension splitting the result into series.
    pub stratifier: Option<String>,

    /// Raw filter group strings, one per `filter` parameter instance.
    #[serde(default)]
    pub filters: Vec<String>,
}

/// A fully planned aggregation: compiled queries plus the request echo the
/// response needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPlan {
    pub column: String,
    pub stratifier: Option<String>,
    pub filters: Vec<String>,
    pub has_error_bounds: bool,
    /// The main rollup query, ordered by stratifier then x.
    pub primary: SqlQuery,
    /// Per-category totals from the unstratified rollup. Present exactly
    /// when a stratifier was requested.
    pub denominator: Option<SqlQuery>,
}

/// Validate and plan an aggregation request against a cube schema.
pub fn plan(
    schema: &CubeSchema,
    request: &AggregationRequest,
) -> Result<AggregationPlan, ValidationError> {
    let column = request
        .column
        .as_deref()
        .ok_or(ValidationError::NoColumnRequested)?;
    let column = schema.validate_dimension(column)?.name.clone();

    let stratifier = match request.stratifier.as_deref() {
        Some(name) => Some(
            schema
                .validate_dimension(name)
                .map_err(|err| match err {
                    ValidationError::UnknownColumn { column } => {
                        ValidationError::UnknownStratifier { stratifier: column }
                    }
                    other => other,
                })?
                .name
                .clone(),
        ),
        None => None,
    };

    let filter = parse_filters(&request.filters, schema)?;
    let unused = unused_columns(schema, &column, stratifier.as_deref(), &filter);

    debug!(
        table = %schema.table,
        column = %column,
        stratifier = ?stratifier,
        filter_clauses = filter.clauses.len(),
        pinned_null = unused.len(),
        "planning aggregation"
    );

    let has_error_bounds = schema.has_error_bounds();
    let primary = primary_query(
        schema,
        &column,
        stratifier.as_deref(),
        &filter,
        &unused,
        has_error_bounds,
    );
    let denominator = stratifier
        .as_deref()
        .map(|strat| denominator_query(schema, &column, strat, &filter, &unused));

    Ok(AggregationPlan {
        column,
        stratifier,
        filters: request.filters.clone(),
        has_error_bounds,
        primary,
        denominator,
    })
}

/// Dimension columns the request does not touch: everything except the
/// requested column, the stratifier, and any filter-referenced column.
fn unused_columns(
    schema: &CubeSchema,
    column: &str,
    stratifier: Option<&str>,
    filter: &CompiledFilter,
) -> Vec<String> {
    let filter_columns = filter.columns();
    schema
        .dimension_columns()
        .map(|c| c.name.clone())
        .filter(|name| {
            name != column
                && Some(name.as_str()) != stratifier
                && !filter_columns.contains(&name.as_str())
        })
        .collect()
}

fn primary_query(
    schema: &CubeSchema,
    column: &str,
    stratifier: Option<&str>,
    filter: &CompiledFilter,
    unused: &[String],
    has_error_bounds: bool,
) -> SqlQuery {
    let mut builder = QueryBuilder::new(&schema.table);

    if let Some(strat) = stratifier {
        builder = builder.select_raw(&format!("{} AS stratifier", quote_ident(strat)));
    }
    builder = builder
        .select_raw(&format!("{} AS x", quote_ident(column)))
        .select_raw(&format!("SUM({}) AS y", quote_ident(MEASURE_COUNT)));
    if has_error_bounds {
        builder = builder
            .select_raw(&format!("SUM({}) AS y_min", quote_ident(MEASURE_COUNT_MIN)))
            .select_raw(&format!("SUM({}) AS y_max", quote_ident(MEASURE_COUNT_MAX)));
    }

    if let Some(strat) = stratifier {
        builder = builder.and_where(&format!("{} IS NOT NULL", quote_ident(strat)), Vec::new());
    }
    builder = builder.and_where(&format!("{} IS NOT NULL", quote_ident(column)), Vec::new());
    builder = pin_unused(builder, unused);
    builder = apply_filter(builder, filter);

    if let Some(strat) = stratifier {
        builder = builder.group_by(strat).order(strat, SortDir::Asc);
    }
    builder.group_by(column).order(column, SortDir::Asc).compile()
}

/// The unstratified per-category totals: same FROM and unused/filter
/// predicate, but pinned to the rollup rows where the stratifier is NULL.
///
/// The x value is selected under the alias `stratifier` for wire
/// compatibility with existing callers, which read it as the category key of
/// the `counts` map.
fn denominator_query(
    schema: &CubeSchema,
    column: &str,
    stratifier: &str,
    filter: &CompiledFilter,
    unused: &[String],
) -> SqlQuery {
    let mut builder = QueryBuilder::new(&schema.table)
        .select_raw(&format!("{} AS stratifier", quote_ident(column)))
        .select_raw(&format!("SUM({}) AS total", quote_ident(MEASURE_COUNT)))
        .and_where(&format!("{} IS NOT NULL", quote_ident(column)), Vec::new());
    builder = pin_unused(builder, unused);
    builder = builder.and_where(&format!("{} IS NULL", quote_ident(stratifier)), Vec::new());
    builder = apply_filter(builder, filter);

    builder.group_by(column).order(column, SortDir::Asc).compile()
}

fn pin_unused(mut builder: QueryBuilder, unused: &[String]) -> QueryBuilder {
    for column in unused {
        builder = builder.and_where(&format!("{} IS NULL", quote_ident(column)), Vec::new());
    }
    builder
}

fn apply_filter(builder: QueryBuilder, filter: &CompiledFilter) -> QueryBuilder {
    if filter.is_empty() {
        return builder;
    }
    builder.and_where(
        &format!("({})", filter.predicate()),
        filter.params.clone(),
    )
}
