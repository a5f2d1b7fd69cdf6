//! Integration tests for the result shaper.

use cubemill::cube::{ColumnDescriptor, CubeSchema, DataType};
use cubemill::plan::{plan, AggregationPlan, AggregationRequest};
use cubemill::shape::{
    decode_denominator_rows, decode_primary_rows, shape, DenominatorRow, PrimaryRow, Row,
};
use cubemill::sql::Scalar;

fn schema() -> CubeSchema {
    CubeSchema::new(
        "cube_1",
        vec![
            ColumnDescriptor::new("a", DataType::String),
            ColumnDescriptor::new("b", DataType::String),
            ColumnDescriptor::new("cnt", DataType::Integer),
        ],
    )
}

fn plan_for(stratifier: Option<&str>) -> AggregationPlan {
    plan(
        &schema(),
        &AggregationRequest {
            column: Some("a".into()),
            stratifier: stratifier.map(Into::into),
            filters: Vec::new(),
        },
    )
    .unwrap()
}

fn row(strat: Option<&str>, x: &str, y: i64) -> PrimaryRow {
    PrimaryRow {
        stratifier: strat.map(Scalar::from),
        x: Scalar::from(x),
        y: Scalar::Int(y),
        y_min: None,
        y_max: None,
    }
}

#[test]
fn test_series_split_on_stratifier_change() {
    let rows = vec![
        row(Some("s1"), "x1", 1),
        row(Some("s1"), "x2", 2),
        row(Some("s2"), "x1", 3),
    ];
    let response = shape(&plan_for(Some("b")), rows, Some(Vec::new()));
    assert_eq!(response.data.len(), 2);
    assert_eq!(response.data[0].stratifier, Some(Scalar::from("s1")));
    assert_eq!(response.data[0].rows.len(), 2);
    assert_eq!(response.data[1].stratifier, Some(Scalar::from("s2")));
    assert_eq!(response.data[1].rows.len(), 1);
}

#[test]
fn test_repeated_stratifier_value_reuses_open_series() {
    // The fold only looks at the currently open series; ordering is the
    // execution layer's contract.
    let rows = vec![
        row(Some("s1"), "x1", 1),
        row(Some("s2"), "x1", 2),
        row(Some("s1"), "x2", 3),
    ];
    let response = shape(&plan_for(Some("b")), rows, Some(Vec::new()));
    assert_eq!(response.data.len(), 3);
}

#[test]
fn test_counts_and_totals() {
    let rows = vec![row(None, "x", 5), row(None, "y", 3)];
    let denominator = vec![
        DenominatorRow {
            stratifier: Scalar::from("x"),
            total: Scalar::Int(12),
        },
        DenominatorRow {
            stratifier: Scalar::from("y"),
            total: Scalar::Int(8),
        },
    ];
    let response = shape(&plan_for(Some("b")), rows, Some(denominator));
    assert_eq!(response.total_count, 8);
    assert_eq!(response.row_count, 2);
    let counts = response.counts.unwrap();
    assert_eq!(counts["x"], 12);
    assert_eq!(counts["y"], 8);
}

#[test]
fn test_end_to_end_unstratified_shape() {
    // Cube rows [{a:"x",b:null,cnt:5},{a:"y",b:null,cnt:3}] aggregated on a.
    let raw: Vec<Row> = vec![
        serde_json::from_value(serde_json::json!({"x": "x", "y": 5})).unwrap(),
        serde_json::from_value(serde_json::json!({"x": "y", "y": 3})).unwrap(),
    ];
    let rows = decode_primary_rows(&raw).unwrap();
    let response = shape(&plan_for(None), rows, None);

    assert_eq!(response.row_count, 2);
    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].stratifier, None);
    assert_eq!(
        serde_json::to_value(&response.data[0].rows).unwrap(),
        serde_json::json!([["x", 5], ["y", 3]])
    );
}

#[test]
fn test_string_measures_count_instead_of_vanishing() {
    // Drivers that return aggregates as strings must still contribute to the
    // totals; a measure that is not a number at all is an execution error,
    // never a silent zero.
    let raw: Vec<Row> = vec![
        serde_json::from_value(serde_json::json!({"x": "x", "y": "5"})).unwrap(),
        serde_json::from_value(serde_json::json!({"x": "y", "y": "3"})).unwrap(),
    ];
    let rows = decode_primary_rows(&raw).unwrap();
    let response = shape(&plan_for(None), rows, None);
    assert_eq!(response.total_count, 8);

    let bad: Vec<Row> =
        vec![serde_json::from_value(serde_json::json!({"x": "x", "y": "many"})).unwrap()];
    assert!(decode_primary_rows(&bad).is_err());

    let bad_total: Vec<Row> = vec![serde_json::from_value(
        serde_json::json!({"stratifier": "x", "total": "several"}),
    )
    .unwrap()];
    assert!(decode_denominator_rows(&bad_total).is_err());
}

#[test]
fn test_numeric_category_keys() {
    let denominator = vec![DenominatorRow {
        stratifier: Scalar::Int(7),
        total: Scalar::Int(2),
    }];
    let response = shape(&plan_for(Some("b")), Vec::new(), Some(denominator));
    assert_eq!(response.counts.unwrap()["7"], 2);
}
