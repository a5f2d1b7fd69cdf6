//! SQL assembly: the parameterized query builder and scalar values.
//!
//! - [`builder`] - fluent SELECT builder with left-fold AND/OR precedence
//! - [`value`] - scalar parameter/result values

pub mod builder;
pub mod value;

pub use builder::{quote_ident, JoinKind, QueryBuilder, SortDir, SqlQuery};
pub use value::Scalar;
