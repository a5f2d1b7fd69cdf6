//! Filter expression parser.
//!
//! A filter request is a sequence of filter groups (one per `filter`
//! parameter instance). Each group is a comma-separated list of clauses of
//! the form `column:operator[:value]`; the value may itself contain colons.
//!
//! Join semantics: clauses within a group OR together, and each group as a
//! whole ANDs onto everything before it. Concretely, the first clause of a
//! group carries an AND join and every following clause an OR join, which the
//! query builder's left-fold rule then parenthesizes at the transitions.

use crate::cube::CubeSchema;
use crate::error::ValidationError;
use crate::filter::operator::Operator;
use crate::sql::{JoinKind, Scalar};

/// One parsed and validated filter clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub column: String,
    pub operator: Operator,
    /// Rendered SQL fragment for this clause (column already interpolated).
    pub fragment: String,
    pub join: JoinKind,
}

/// A fully parsed filter: ordered clauses plus bound values in clause order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFilter {
    pub clauses: Vec<FilterClause>,
    pub params: Vec<Scalar>,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Every column referenced by a clause, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for clause in &self.clauses {
            if !seen.contains(&clause.column.as_str()) {
                seen.push(&clause.column);
            }
        }
        seen
    }

    /// Apply every clause onto a query builder, preserving join kinds. This
    /// is the path the plain list endpoints take; the aggregation planner
    /// instead folds the filter into a single parenthesized unit via
    /// [`predicate`](Self::predicate).
    pub fn apply(&self, mut builder: crate::sql::QueryBuilder) -> crate::sql::QueryBuilder {
        let mut params = self.params.iter();
        for clause in &self.clauses {
            let bound = if clause.operator.binds_value() {
                params.next().cloned().into_iter().collect()
            } else {
                Vec::new()
            };
            builder = builder.where_join(clause.join, &clause.fragment, bound);
        }
        builder
    }

    /// Render the whole filter as one predicate string, applying the same
    /// left-fold parenthesization as the query builder. The caller wraps the
    /// result in parentheses before AND-ing it into a larger WHERE clause.
    pub fn predicate(&self) -> String {
        let mut sql = String::new();
        let mut last: Option<JoinKind> = None;
        for clause in &self.clauses {
            if sql.is_empty() {
                sql = clause.fragment.clone();
                continue;
            }
            match last {
                Some(prev) if prev != clause.join => {
                    sql = format!("({}) {} {}", sql, clause.join.keyword(), clause.fragment);
                }
                _ => {
                    sql = format!("{} {} {}", sql, clause.join.keyword(), clause.fragment);
                }
            }
            last = Some(clause.join);
        }
        sql
    }
}

/// Parse one or more filter group strings against a cube schema.
///
/// Each group string is comma-split into clauses. All validation is local
/// and fails fast: no SQL is built from a request that does not fully
/// validate, and every rejection names the offending token.
pub fn parse_filters(
    groups: &[String],
    schema: &CubeSchema,
) -> Result<CompiledFilter, ValidationError> {
    let mut filter = CompiledFilter::default();

    for group in groups {
        for (index, clause) in group.split(',').enumerate() {
            let parsed = parse_clause(clause, index == 0, schema)?;
            if let Some(value) = parsed.1 {
                filter.params.push(value);
            }
            filter.clauses.push(parsed.0);
        }
    }

    Ok(filter)
}

fn parse_clause(
    clause: &str,
    first_in_group: bool,
    schema: &CubeSchema,
) -> Result<(FilterClause, Option<Scalar>), ValidationError> {
    let mut parts = clause.splitn(3, ':');
    let column = parts.next().unwrap_or_default();
    let operator_name = parts
        .next()
        .ok_or_else(|| ValidationError::MalformedClause {
            clause: clause.to_string(),
        })?;
    let value = parts.next();

    let descriptor = schema.validate_dimension(column)?;

    let operator =
        Operator::parse(operator_name).ok_or_else(|| ValidationError::UnknownOperator {
            operator: operator_name.to_string(),
        })?;

    let bound = if operator.binds_value() {
        let raw = value.ok_or_else(|| ValidationError::MissingValue {
            operator: operator_name.to_string(),
            clause: clause.to_string(),
        })?;
        Some(operator.bind_value(raw))
    } else {
        None
    };

    Ok((
        FilterClause {
            column: descriptor.name.clone(),
            operator,
            fragment: operator.fragment(&descriptor.name),
            join: if first_in_group {
                JoinKind::And
            } else {
                JoinKind::Or
            },
        },
        bound,
    ))
}
