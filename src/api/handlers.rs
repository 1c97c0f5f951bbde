//! API Handlers
//!
//! HTTP request handlers for each front-end endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::error::Result;
use crate::group::{Group, GroupRegistry};
use crate::models::{ApiQuery, GroupStatsResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Every group on this node, reported by /stats
    pub registry: GroupRegistry,
    /// The group /api looks keys up in
    pub group: Arc<Group>,
}

impl ApiState {
    pub fn new(registry: GroupRegistry, group: Arc<Group>) -> Self {
        Self { registry, group }
    }
}

/// Handler for GET /api?key=<key>
///
/// Returns the raw value bytes. A missing key is rejected by the group.
pub async fn api_handler(
    State(state): State<ApiState>,
    Query(query): Query<ApiQuery>,
) -> Result<impl IntoResponse> {
    debug!("api lookup {}/{}", state.group.name(), query.key);
    let view = state.group.get(&query.key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.to_vec(),
    ))
}

/// Handler for GET /stats
///
/// Returns group counters and cache statistics for every group.
pub async fn stats_handler(State(state): State<ApiState>) -> Json<StatsResponse> {
    let groups = state
        .registry
        .groups()
        .into_iter()
        .map(|group| GroupStatsResponse::new(group.name(), group.stats(), group.cache_stats()))
        .collect();

    Json(StatsResponse { groups })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::group::GetterFn;

    fn create_test_state() -> ApiState {
        let registry = GroupRegistry::new();
        let group = Group::builder("scores")
            .getter(GetterFn::new(|key: String| async move {
                match key.as_str() {
                    "Tom" => Ok(b"630".to_vec()),
                    _ => Err(anyhow::anyhow!("{} not exist", key)),
                }
            }))
            .register(&registry)
            .unwrap();
        ApiState::new(registry, group)
    }

    fn query(key: &str) -> Query<ApiQuery> {
        Query(ApiQuery {
            key: key.to_string(),
        })
    }

    #[tokio::test]
    async fn test_api_handler_hit() {
        let state = create_test_state();
        let result = api_handler(State(state.clone()), query("Tom")).await;
        assert!(result.is_ok());
        assert_eq!(state.group.stats().local_loads, 1);
    }

    #[tokio::test]
    async fn test_api_handler_loader_error() {
        let state = create_test_state();
        let result = api_handler(State(state), query("kkk")).await;
        assert!(matches!(result, Err(CacheError::Loader(_))));
    }

    #[tokio::test]
    async fn test_api_handler_empty_key() {
        let state = create_test_state();
        let result = api_handler(State(state), query("")).await;
        assert!(matches!(result, Err(CacheError::EmptyKey)));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = create_test_state();
        state.group.get("Tom").await.unwrap();
        state.group.get("Tom").await.unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.groups.len(), 1);
        let scores = &response.groups[0];
        assert_eq!(scores.name, "scores");
        assert_eq!(scores.group.gets, 2);
        assert_eq!(scores.group.cache_hits, 1);
        assert_eq!(scores.cache.total_entries, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
