//! # Cubemill
//!
//! A filter-expression compiler and aggregation engine for sparse,
//! pre-aggregated cube tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Request (column, stratifier, filter strings)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [cache gate]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Fingerprint check (not-modified short-circuit)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [filter parser + planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Parameterized SQL (primary + optional denominator)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor (external database)]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Flat rows, ordered by plan                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [shaper]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Stratified series + category totals             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine compiles, executes, and reshapes; it never authenticates,
//! persists, or renders. Column identifiers are validated against the cube
//! schema before they reach SQL text, and values only ever travel as bound
//! parameters.

pub mod cache;
pub mod config;
pub mod cube;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod plan;
pub mod shape;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cache::{CacheDecision, CacheGate, CACHE_CONTROL};
    pub use crate::config::Settings;
    pub use crate::cube::{ColumnDescriptor, CubeSchema, DataType};
    pub use crate::engine::{AggregationEngine, AggregationOutcome, CubeExecutor};
    pub use crate::error::{EngineError, EngineResult, ExecutionError, ValidationError};
    pub use crate::export::Delimiter;
    pub use crate::filter::{parse_filters, CompiledFilter, Operator};
    pub use crate::plan::{plan, AggregationPlan, AggregationRequest};
    pub use crate::shape::{shape, AggregationResponse, Series};
    pub use crate::sql::{JoinKind, QueryBuilder, Scalar, SortDir, SqlQuery};
}

// Also export the workhorse types at the crate root.
pub use cube::{ColumnDescriptor, CubeSchema, DataType};
pub use engine::{AggregationEngine, AggregationOutcome, CubeExecutor};
pub use error::{EngineError, EngineResult};
pub use plan::{AggregationPlan, AggregationRequest};
pub use shape::AggregationResponse;
pub use sql::{QueryBuilder, Scalar, SqlQuery};
