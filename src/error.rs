//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Runtime failures from
//! `Group::get` and the peer transport use [`CacheError`]; wiring mistakes
//! made while setting groups up use [`ConfigError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Runtime error type for lookups and peer transport.
///
/// Cloneable so a single load result can be handed to every caller that
/// was waiting on the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key passed to a lookup
    #[error("key is required")]
    EmptyKey,

    /// The authoritative loader failed
    #[error("load failed: {0}")]
    Loader(String),

    /// A remote peer could not serve the request
    #[error("peer fetch failed: {0}")]
    Transport(String),

    /// No group registered under this name
    #[error("no such group: {0}")]
    NoSuchGroup(String),

    /// Malformed inbound request
    #[error("bad request: {0}")]
    BadRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NoSuchGroup(_) => StatusCode::NOT_FOUND,
            CacheError::EmptyKey
            | CacheError::Loader(_)
            | CacheError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Config Error Enum ==
/// Setup-time error raised while building and wiring groups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `register_peers` was called twice on the same group
    #[error("peers already registered for group {0}")]
    PeersAlreadyRegistered(String),

    /// A group was built without a loader
    #[error("group {0} has no loader")]
    MissingLoader(String),

    /// A group with this name already exists in the registry
    #[error("group {0} is already registered")]
    DuplicateGroup(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache lookups.
pub type Result<T> = std::result::Result<T, CacheError>;
