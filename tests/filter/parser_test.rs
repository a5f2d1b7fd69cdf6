//! Integration tests for the filter expression parser.

use cubemill::cube::{ColumnDescriptor, CubeSchema, DataType};
use cubemill::error::ValidationError;
use cubemill::filter::parse_filters;
use cubemill::sql::{JoinKind, Scalar};

fn schema() -> CubeSchema {
    CubeSchema::new(
        "cube_1",
        vec![
            ColumnDescriptor::new("gender", DataType::String),
            ColumnDescriptor::new("age", DataType::Integer),
            ColumnDescriptor::new("active", DataType::Boolean),
            ColumnDescriptor::new("seen_at", DataType::Date),
            ColumnDescriptor::new("cnt", DataType::Integer),
        ],
    )
}

#[test]
fn test_group_or_semantics() {
    let filter = parse_filters(
        &["gender:eq:male,gender:eq:other".into()],
        &schema(),
    )
    .unwrap();
    let joins: Vec<JoinKind> = filter.clauses.iter().map(|c| c.join).collect();
    assert_eq!(joins, vec![JoinKind::And, JoinKind::Or]);
}

#[test]
fn test_multiple_groups_and_together() {
    let filter = parse_filters(
        &[
            "gender:eq:male,gender:eq:other".to_string(),
            "age:gt:3,age:lt:10".to_string(),
        ],
        &schema(),
    )
    .unwrap();
    assert_eq!(
        filter.predicate(),
        "((\"gender\" = ? OR \"gender\" = ?) AND \"age\" > ?) OR \"age\" < ?"
    );
}

#[test]
fn test_params_in_clause_order() {
    let filter = parse_filters(
        &["gender:eq:male,age:gt:3".to_string(), "active:isTrue".to_string()],
        &schema(),
    )
    .unwrap();
    assert_eq!(
        filter.params,
        vec![Scalar::Text("male".into()), Scalar::Text("3".into())]
    );
    assert_eq!(filter.clauses.len(), 3);
}

#[test]
fn test_round_trip_idempotence() {
    let groups = vec!["gender:eq:male,age:gt:3".to_string()];
    let first = parse_filters(&groups, &schema()).unwrap();
    let second = parse_filters(&groups, &schema()).unwrap();
    assert_eq!(first.predicate(), second.predicate());
    assert_eq!(first.params, second.params);
    assert_eq!(first.predicate(), "\"gender\" = ? OR \"age\" > ?");
}

#[test]
fn test_date_value_with_colons_survives() {
    let filter =
        parse_filters(&["seen_at:afterDay:2023-05-01T12:30:00Z".into()], &schema()).unwrap();
    assert_eq!(
        filter.params,
        vec![Scalar::Text("2023-05-01T12:30:00Z".into())]
    );
}

#[test]
fn test_error_taxonomy() {
    let schema = schema();

    assert!(matches!(
        parse_filters(&["age".into()], &schema).unwrap_err(),
        ValidationError::MalformedClause { .. }
    ));
    assert_eq!(
        parse_filters(&["age:foo:1".into()], &schema).unwrap_err(),
        ValidationError::UnknownOperator {
            operator: "foo".into()
        }
    );
    assert!(matches!(
        parse_filters(&["age:gt".into()], &schema).unwrap_err(),
        ValidationError::MissingValue { .. }
    ));
    assert!(matches!(
        parse_filters(&["nope:eq:1".into()], &schema).unwrap_err(),
        ValidationError::UnknownColumn { .. }
    ));
    assert!(matches!(
        parse_filters(&["cnt:eq:1".into()], &schema).unwrap_err(),
        ValidationError::ReservedColumn { .. }
    ));
}

#[test]
fn test_error_messages_name_the_token() {
    let err = parse_filters(&["age:banana:1".into()], &schema()).unwrap_err();
    assert!(err.to_string().contains("banana"));

    let err = parse_filters(&["mystery:eq:1".into()], &schema()).unwrap_err();
    assert!(err.to_string().contains("mystery"));
}

#[test]
fn test_empty_filter_list_is_empty_filter() {
    let filter = parse_filters(&[], &schema()).unwrap();
    assert!(filter.is_empty());
    assert_eq!(filter.predicate(), "");
}
