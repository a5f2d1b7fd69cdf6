//! Filter expression language: operator catalog and parser.
//!
//! - [`operator`] - the closed operator catalog and its SQL fragments
//! - [`parser`] - `column:operator[:value]` clause parsing and validation

pub mod operator;
pub mod parser;

pub use operator::{DateCompare, DateGranularity, Operator, TextMatch};
pub use parser::{parse_filters, CompiledFilter, FilterClause};
