//! Response DTOs for the front-end API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::group::GroupStatsSnapshot;

/// Statistics for one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatsResponse {
    /// Group name
    pub name: String,
    /// Lookup counters
    pub group: GroupStatsSnapshot,
    /// Local cache counters
    pub cache: CacheStats,
    /// Local cache hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Share of the byte budget in use
    pub budget_used: f64,
}

impl GroupStatsResponse {
    pub fn new(name: impl Into<String>, group: GroupStatsSnapshot, cache: CacheStats) -> Self {
        Self {
            name: name.into(),
            hit_rate: cache.hit_rate(),
            budget_used: cache.budget_used(),
            group,
            cache,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub groups: Vec<GroupStatsResponse>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
