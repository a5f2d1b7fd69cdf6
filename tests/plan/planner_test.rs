//! Integration tests for the aggregation planner.

use cubemill::cube::{ColumnDescriptor, CubeSchema, DataType};
use cubemill::error::ValidationError;
use cubemill::plan::{plan, AggregationRequest};
use cubemill::sql::Scalar;

fn schema() -> CubeSchema {
    CubeSchema::new(
        "cube_5",
        vec![
            ColumnDescriptor::new("a", DataType::String),
            ColumnDescriptor::new("b", DataType::String),
            ColumnDescriptor::new("c", DataType::String),
            ColumnDescriptor::new("d", DataType::Integer),
            ColumnDescriptor::new("cnt", DataType::Integer),
        ],
    )
}

fn schema_with_bounds() -> CubeSchema {
    let mut schema = schema();
    schema
        .columns
        .push(ColumnDescriptor::new("cnt_min", DataType::Integer));
    schema
        .columns
        .push(ColumnDescriptor::new("cnt_max", DataType::Integer));
    schema
}

fn request(column: &str, stratifier: Option<&str>, filters: &[&str]) -> AggregationRequest {
    AggregationRequest {
        column: Some(column.into()),
        stratifier: stratifier.map(Into::into),
        filters: filters.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn test_sparsity_invariant() {
    // Requesting a stratified by b: c and d must be pinned NULL, a and b not.
    let plan = plan(&schema(), &request("a", Some("b"), &[])).unwrap();
    let sql = &plan.primary.sql;
    assert!(sql.contains("\"c\" IS NULL"));
    assert!(sql.contains("\"d\" IS NULL"));
    assert!(!sql.contains("\"a\" IS NULL"));
    assert!(!sql.contains("\"b\" IS NULL"));
}

#[test]
fn test_primary_query_shape_unstratified() {
    let plan = plan(&schema(), &request("a", None, &[])).unwrap();
    assert_eq!(
        plan.primary.sql,
        "SELECT \"a\" AS x, SUM(\"cnt\") AS y FROM \"cube_5\" \
         WHERE \"a\" IS NOT NULL AND \"b\" IS NULL AND \"c\" IS NULL AND \"d\" IS NULL \
         GROUP BY \"a\" ORDER BY \"a\" ASC"
    );
    assert!(plan.primary.params.is_empty());
    assert!(plan.denominator.is_none());
}

#[test]
fn test_primary_query_shape_stratified() {
    let plan = plan(&schema(), &request("a", Some("b"), &[])).unwrap();
    assert_eq!(
        plan.primary.sql,
        "SELECT \"b\" AS stratifier, \"a\" AS x, SUM(\"cnt\") AS y FROM \"cube_5\" \
         WHERE \"b\" IS NOT NULL AND \"a\" IS NOT NULL AND \"c\" IS NULL AND \"d\" IS NULL \
         GROUP BY \"b\", \"a\" ORDER BY \"b\" ASC, \"a\" ASC"
    );
}

#[test]
fn test_error_bound_columns_selected_when_present() {
    let plan = plan(&schema_with_bounds(), &request("a", None, &[])).unwrap();
    assert!(plan.has_error_bounds);
    assert!(plan.primary.sql.contains("SUM(\"cnt_min\") AS y_min"));
    assert!(plan.primary.sql.contains("SUM(\"cnt_max\") AS y_max"));
}

#[test]
fn test_filter_predicate_is_one_parenthesized_unit() {
    let plan = plan(
        &schema(),
        &request("a", None, &["b:eq:x,b:eq:y", "d:gt:3"]),
    )
    .unwrap();
    assert!(plan
        .primary
        .sql
        .contains("((\"b\" = ? OR \"b\" = ?) AND \"d\" > ?)"));
    assert_eq!(
        plan.primary.params,
        vec![
            Scalar::Text("x".into()),
            Scalar::Text("y".into()),
            Scalar::Text("3".into())
        ]
    );
}

#[test]
fn test_denominator_reads_unstratified_rollup() {
    let plan = plan(&schema(), &request("a", Some("b"), &["d:gt:3"])).unwrap();
    let denom = plan.denominator.unwrap();
    assert_eq!(
        denom.sql,
        "SELECT \"a\" AS stratifier, SUM(\"cnt\") AS total FROM \"cube_5\" \
         WHERE \"a\" IS NOT NULL AND \"c\" IS NULL AND \"b\" IS NULL AND (\"d\" > ?) \
         GROUP BY \"a\" ORDER BY \"a\" ASC"
    );
    // The filter params are bound independently in the denominator.
    assert_eq!(denom.params, vec![Scalar::Text("3".into())]);
}

#[test]
fn test_validation_failures() {
    let schema = schema();

    assert_eq!(
        plan(&schema, &AggregationRequest::default()).unwrap_err(),
        ValidationError::NoColumnRequested
    );
    assert!(matches!(
        plan(&schema, &request("cnt", None, &[])).unwrap_err(),
        ValidationError::ReservedColumn { .. }
    ));
    assert!(matches!(
        plan(&schema, &request("zzz", None, &[])).unwrap_err(),
        ValidationError::UnknownColumn { .. }
    ));
    assert_eq!(
        plan(&schema, &request("a", Some("zzz"), &[])).unwrap_err(),
        ValidationError::UnknownStratifier {
            stratifier: "zzz".into()
        }
    );
    // A bad filter fails the whole plan before any SQL exists.
    assert!(matches!(
        plan(&schema, &request("a", None, &["b:foo:1"])).unwrap_err(),
        ValidationError::UnknownOperator { .. }
    ));
}

#[test]
fn test_request_echo_carried_on_plan() {
    let plan = plan(&schema(), &request("a", Some("b"), &["d:gt:3"])).unwrap();
    assert_eq!(plan.column, "a");
    assert_eq!(plan.stratifier.as_deref(), Some("b"));
    assert_eq!(plan.filters, vec!["d:gt:3".to_string()]);
}
