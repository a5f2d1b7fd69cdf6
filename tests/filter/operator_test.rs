//! Integration tests for the operator catalog.

use cubemill::filter::Operator;
use cubemill::sql::Scalar;

/// Every catalog operator compiles to a fragment with exactly one `?` when
/// it binds a value and zero otherwise.
#[test]
fn test_placeholder_count_matches_arity() {
    for op in Operator::all() {
        let fragment = op.fragment("col");
        let placeholders = fragment.matches('?').count();
        let expected = usize::from(op.binds_value());
        assert_eq!(
            placeholders,
            expected,
            "operator '{}' produced '{}'",
            op.name(),
            fragment
        );
    }
}

#[test]
fn test_every_name_resolves_to_itself() {
    for op in Operator::all() {
        assert_eq!(Operator::parse(&op.name()), Some(op));
    }
}

#[test]
fn test_catalog_names_are_unique() {
    let mut names: Vec<String> = Operator::all().iter().map(Operator::name).collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before);
}

#[test]
fn test_date_operator_superset_includes_week() {
    for name in ["sameWeek", "beforeWeek", "afterWeek", "sameOrBeforeWeek", "sameOrAfterWeek"] {
        let op = Operator::parse(name).unwrap_or_else(|| panic!("missing {name}"));
        assert!(op.fragment("d").contains("DATE_TRUNC('week'"));
    }
}

#[test]
fn test_text_negations_exist_for_every_text_operator() {
    for name in [
        "notEq",
        "notEqCI",
        "notContains",
        "notContainsCI",
        "notStartsWith",
        "notStartsWithCI",
        "notEndsWith",
        "notEndsWithCI",
        "notMatches",
        "notMatchesCI",
    ] {
        assert!(Operator::parse(name).is_some(), "missing {name}");
    }
}

#[test]
fn test_like_wildcards_in_values_are_escaped() {
    let starts = Operator::parse("startsWith").unwrap();
    assert_eq!(starts.bind_value("50%_off"), Scalar::Text("50\\%\\_off%".into()));

    let ends = Operator::parse("endsWith").unwrap();
    assert_eq!(ends.bind_value("a_b"), Scalar::Text("%a\\_b".into()));
}

#[test]
fn test_column_identifier_is_quoted_in_fragment() {
    let op = Operator::parse("gt").unwrap();
    assert_eq!(op.fragment("age"), "\"age\" > ?");
}
