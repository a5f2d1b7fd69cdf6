//! Cache gate: content fingerprinting and not-modified short-circuiting.
//!
//! An aggregation's result can only change when the underlying data request
//! is refreshed, so freshness is governed by a validation token rather than a
//! TTL: the caller presents the token it last saw, and on a match the engine
//! skips planning and execution entirely.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::EngineResult;
use crate::plan::AggregationRequest;

/// Cache directive to pair with the token: cache as long as you like, but
/// always revalidate against the token.
pub const CACHE_CONTROL: &str = "public, max-age=31536000, no-cache";

/// Outcome of the gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// The caller's token still matches; skip planning and execution.
    NotModified,
    /// Proceed; attach this token to the response.
    Miss { token: String },
}

/// Everything that can change an aggregation's result.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    table: &'a str,
    column: Option<&'a str>,
    stratifier: Option<&'a str>,
    /// Filter groups, sorted so that parameter order does not matter.
    filters: Vec<&'a str>,
    refreshed_at: &'a str,
    version: &'a str,
}

/// Computes fingerprints and short-circuits unchanged requests.
#[derive(Debug, Clone)]
pub struct CacheGate {
    /// Engine/schema version folded into every fingerprint, so deployments
    /// that change query shape invalidate old tokens.
    version: String,
}

impl CacheGate {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Compute the content fingerprint for a request.
    ///
    /// `refreshed_at` is the data-freshness marker of the cube (the time the
    /// data request was last refreshed), supplied by the caller.
    pub fn fingerprint(
        &self,
        table: &str,
        request: &AggregationRequest,
        refreshed_at: &str,
    ) -> EngineResult<String> {
        let mut filters: Vec<&str> = request.filters.iter().map(String::as_str).collect();
        filters.sort_unstable();

        let input = FingerprintInput {
            table,
            column: request.column.as_deref(),
            stratifier: request.stratifier.as_deref(),
            filters,
            refreshed_at,
            version: &self.version,
        };

        let json = serde_json::to_string(&input)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Compare a freshly computed fingerprint against the caller's token.
    pub fn check(&self, fingerprint: String, caller_token: Option<&str>) -> CacheDecision {
        match caller_token {
            Some(token) if token == fingerprint => CacheDecision::NotModified,
            _ => CacheDecision::Miss { token: fingerprint },
        }
    }
}
