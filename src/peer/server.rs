//! Peer-facing HTTP server.
//!
//! Serves `GET <base_path><group>/<key>` from the groups in a registry.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, Uri},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::models::PeerResponse;
use crate::peer::HttpPool;

/// State shared by the peer handler.
#[derive(Clone)]
pub struct PeerServerState {
    pub pool: Arc<HttpPool>,
    pub registry: GroupRegistry,
}

/// Creates the router other nodes fetch values from.
///
/// # Middleware
/// - Tracing: Logs all requests for debugging
pub fn create_peer_router(pool: Arc<HttpPool>, registry: GroupRegistry) -> Router {
    let route = format!("{}*path", pool.base_path());

    // The wildcard needs a non-empty tail, so the bare base path gets its own route
    Router::new()
        .route(pool.base_path(), get(peer_handler))
        .route(&route, get(peer_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(PeerServerState { pool, registry })
}

/// Handler for GET `<base_path><group>/<key>`
///
/// Looks the key up in the named group, which may run the group's loader.
pub async fn peer_handler(
    State(state): State<PeerServerState>,
    method: Method,
    uri: Uri,
) -> Result<Json<PeerResponse>> {
    info!("[Server {}] {} {}", state.pool.self_addr(), method, uri.path());

    let (group_name, key) = parse_peer_path(state.pool.base_path(), uri.path())?;
    let group = state
        .registry
        .get(&group_name)
        .ok_or(CacheError::NoSuchGroup(group_name))?;

    group.record_server_request();
    let view = group.get(&key).await?;

    Ok(Json(PeerResponse {
        value: view.to_vec(),
    }))
}

/// Splits a raw request path into its decoded group and key.
///
/// The path must be `<base_path><group>/<key>`. Only the first `/` after
/// the group separates the segments.
pub fn parse_peer_path(base_path: &str, path: &str) -> Result<(String, String)> {
    let rest = path
        .strip_prefix(base_path)
        .ok_or_else(|| CacheError::BadRequest(format!("unexpected path: {}", path)))?;

    let (group, key) = rest
        .split_once('/')
        .ok_or_else(|| CacheError::BadRequest(format!("expected {}<group>/<key>", base_path)))?;

    Ok((decode_segment(group)?, decode_segment(key)?))
}

fn decode_segment(segment: &str) -> Result<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| CacheError::BadRequest(format!("invalid path segment: {}", e)))
}
