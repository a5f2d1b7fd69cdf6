//! Query builder - assemble parameterized SELECT statements with a fluent API.
//!
//! Unlike a classic mutable builder this is a value accumulator: every method
//! consumes `self` and returns the extended builder, so the AND/OR precedence
//! algorithm is testable as a pure fold over conditions.
//!
//! Column and table identifiers are interpolated literally into the SQL text.
//! Callers must validate every identifier against the cube's column
//! descriptors first (see [`CubeSchema::validate_column`]); values always
//! travel as bound `?` parameters.
//!
//! [`CubeSchema::validate_column`]: crate::cube::CubeSchema::validate_column

use std::fmt::Write as _;

use super::value::Scalar;

/// Quote an identifier for embedding in SQL text.
///
/// Embedded double quotes are doubled. This is formatting, not a security
/// check; identifiers must already have passed column validation.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// How a condition joins onto the WHERE clause built so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    And,
    Or,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A compiled query: SQL text plus its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Scalar>,
}

/// Fluent SELECT builder.
///
/// WHERE precedence follows a left-fold rule: the builder tracks the join
/// kind of the last appended condition. Appending with the same kind
/// concatenates flat; appending with the other kind first wraps everything
/// accumulated so far in parentheses. A run of same-kind joins therefore
/// stays flat and only kind transitions introduce grouping. This is not
/// general boolean grouping and is pinned by tests as-is.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until compiled"]
pub struct QueryBuilder {
    table: String,
    select: Vec<String>,
    where_sql: String,
    last_join: Option<JoinKind>,
    group_by: Vec<String>,
    order_by: Vec<(String, SortDir)>,
    limit: Option<u64>,
    offset: Option<u64>,
    params: Vec<Scalar>,
}

impl QueryBuilder {
    /// Start a query against the given (already validated) table.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            select: Vec::new(),
            where_sql: String::new(),
            last_join: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            params: Vec::new(),
        }
    }

    /// Replace the target table.
    pub fn table(mut self, table: &str) -> Self {
        self.table = table.into();
        self
    }

    /// Add a raw select expression (caller quotes identifiers as needed).
    pub fn select_raw(mut self, expr: &str) -> Self {
        self.select.push(expr.into());
        self
    }

    /// Add plain columns to the select list.
    pub fn columns(mut self, names: &[&str]) -> Self {
        self.select.extend(names.iter().map(|n| quote_ident(n)));
        self
    }

    /// Append an AND condition from a raw fragment plus its bound values.
    pub fn and_where(self, fragment: &str, params: Vec<Scalar>) -> Self {
        self.append_condition(JoinKind::And, fragment, params)
    }

    /// Append an OR condition from a raw fragment plus its bound values.
    pub fn or_where(self, fragment: &str, params: Vec<Scalar>) -> Self {
        self.append_condition(JoinKind::Or, fragment, params)
    }

    /// Append a condition with an explicit join kind.
    pub fn where_join(self, join: JoinKind, fragment: &str, params: Vec<Scalar>) -> Self {
        self.append_condition(join, fragment, params)
    }

    fn append_condition(mut self, join: JoinKind, fragment: &str, params: Vec<Scalar>) -> Self {
        if self.where_sql.is_empty() {
            self.where_sql = fragment.to_string();
        } else {
            match self.last_join {
                Some(last) if last != join => {
                    // Join kind changed: close over everything accumulated so far.
                    self.where_sql =
                        format!("({}) {} {}", self.where_sql, join.keyword(), fragment);
                }
                _ => {
                    let _ = write!(self.where_sql, " {} {}", join.keyword(), fragment);
                }
            }
            self.last_join = Some(join);
        }
        self.params.extend(params);
        self
    }

    /// Pin the query to one rollup level of a sparse cube: every column in
    /// `all_columns` gets `IS NOT NULL` if it appears in `used`, `IS NULL`
    /// otherwise. All assertions are AND-ed in.
    pub fn white_list(mut self, all_columns: &[&str], used: &[&str]) -> Self {
        for column in all_columns {
            let predicate = if used.contains(column) {
                format!("{} IS NOT NULL", quote_ident(column))
            } else {
                format!("{} IS NULL", quote_ident(column))
            };
            self = self.and_where(&predicate, Vec::new());
        }
        self
    }

    /// Add a GROUP BY column.
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(quote_ident(column));
        self
    }

    /// Add an ORDER BY column.
    pub fn order(mut self, column: &str, dir: SortDir) -> Self {
        self.order_by.push((quote_ident(column), dir));
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Compile to SQL text plus ordered parameters.
    pub fn compile(self) -> SqlQuery {
        let mut sql = String::from("SELECT ");
        if self.select.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select.join(", "));
        }

        let _ = write!(sql, " FROM {}", quote_ident(&self.table));

        if !self.where_sql.is_empty() {
            let _ = write!(sql, " WHERE {}", self.where_sql);
        }

        if !self.group_by.is_empty() {
            let _ = write!(sql, " GROUP BY {}", self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            let rendered: Vec<String> = self
                .order_by
                .iter()
                .map(|(col, dir)| format!("{} {}", col, dir.keyword()))
                .collect();
            let _ = write!(sql, " ORDER BY {}", rendered.join(", "));
        }

        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(sql, " OFFSET {offset}");
        }

        SqlQuery {
            sql,
            params: self.params,
        }
    }
}
