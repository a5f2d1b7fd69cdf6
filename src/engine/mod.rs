//! The aggregation engine: cache gate, planning, execution, and shaping
//! wired into one request flow.
//!
//! Control flow per request:
//!
//! ```text
//! caller -> CacheGate -> parser/planner -> execute (primary + denominator)
//!        -> ResultShaper -> response payload
//! ```
//!
//! The engine holds no cross-request mutable state; the database execution
//! handle is the only suspension point. Each query runs under the configured
//! deadline so a disconnected caller cannot leak an unbounded query.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::cache::{CacheDecision, CacheGate, CACHE_CONTROL};
use crate::config::Settings;
use crate::cube::CubeSchema;
use crate::error::{EngineError, EngineResult, ExecutionError};
use crate::plan::{plan, AggregationPlan, AggregationRequest};
use crate::shape::{
    decode_denominator_rows, decode_primary_rows, shape, AggregationResponse, Row,
};
use crate::sql::SqlQuery;

/// Database execution handle.
///
/// The engine only reads: implementations take parameterized SQL and return
/// rows as JSON objects keyed by the select aliases, in the exact ORDER BY
/// of the query. The shaper depends on that ordering and does not re-sort.
#[async_trait]
pub trait CubeExecutor: Send + Sync {
    async fn fetch(&self, query: &SqlQuery) -> Result<Vec<Row>, ExecutionError>;
}

/// Outcome of an aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationOutcome {
    /// The caller's cache token still validates; no query was run.
    NotModified,
    /// A fresh result plus the token to attach to it.
    Fresh {
        token: String,
        response: AggregationResponse,
    },
}

/// The engine: one instance serves many concurrent requests.
pub struct AggregationEngine<E> {
    executor: E,
    gate: CacheGate,
    query_timeout: Duration,
}

impl<E: CubeExecutor> AggregationEngine<E> {
    pub fn new(executor: E, settings: &Settings) -> Self {
        Self {
            executor,
            gate: CacheGate::new(settings.engine.version.clone()),
            query_timeout: Duration::from_secs(settings.engine.query_timeout_secs),
        }
    }

    /// The cache directive callers should attach alongside the token.
    pub fn cache_control() -> &'static str {
        CACHE_CONTROL
    }

    /// Run one aggregation request end to end.
    ///
    /// `refreshed_at` is the cube's data-freshness marker; `caller_token` is
    /// the validation token from the caller's previous response, if any.
    ///
    /// # Errors
    ///
    /// Validation failures (bad filter syntax, unknown identifiers) are
    /// returned before any query runs; execution failures and timeouts come
    /// back as server faults.
    #[instrument(skip_all, fields(table = %schema.table))]
    pub async fn aggregate(
        &self,
        schema: &CubeSchema,
        request: &AggregationRequest,
        refreshed_at: &str,
        caller_token: Option<&str>,
    ) -> EngineResult<AggregationOutcome> {
        let fingerprint = self.gate.fingerprint(&schema.table, request, refreshed_at)?;
        let token = match self.gate.check(fingerprint, caller_token) {
            CacheDecision::NotModified => {
                debug!("cache token validated, short-circuiting");
                return Ok(AggregationOutcome::NotModified);
            }
            CacheDecision::Miss { token } => token,
        };

        let plan = plan(schema, request)?;
        let response = self.execute(&plan).await?;

        Ok(AggregationOutcome::Fresh { token, response })
    }

    /// Execute a plan's queries and shape the result.
    ///
    /// The denominator query depends only on the plan, not on the primary
    /// query's results, so both are issued concurrently.
    pub async fn execute(&self, plan: &AggregationPlan) -> EngineResult<AggregationResponse> {
        let (primary_rows, denominator_rows) = match &plan.denominator {
            Some(denominator) => {
                let (primary, denom) = futures::future::try_join(
                    self.fetch_with_deadline(&plan.primary),
                    self.fetch_with_deadline(denominator),
                )
                .await?;
                (primary, Some(denom))
            }
            None => (self.fetch_with_deadline(&plan.primary).await?, None),
        };

        let primary = decode_primary_rows(&primary_rows)?;
        let denominator = denominator_rows
            .as_deref()
            .map(decode_denominator_rows)
            .transpose()?;

        debug!(
            rows = primary.len(),
            denominator_rows = denominator.as_ref().map_or(0, Vec::len),
            "queries complete"
        );

        Ok(shape(plan, primary, denominator))
    }

    pub(crate) async fn fetch_with_deadline(&self, query: &SqlQuery) -> EngineResult<Vec<Row>> {
        match tokio::time::timeout(self.query_timeout, self.executor.fetch(query)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(EngineError::Timeout(self.query_timeout.as_secs())),
        }
    }

    /// Borrow the underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }
}
