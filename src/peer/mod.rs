//! Peer Module
//!
//! Capabilities for reaching the peer that owns a key, plus the HTTP
//! implementation used between nodes.
//!
//! # Wire protocol
//! - `GET <peer><base_path><group>/<key>` with both segments percent-encoded
//! - `200` with a JSON [`PeerResponse`](crate::models::PeerResponse) body on success
//! - `400` bad path, `404` unknown group, `500` load failure

mod client;
mod pool;
mod server;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PeerRequest, PeerResponse};

pub use client::HttpGetter;
pub(crate) use pool::normalize_addr;
pub use pool::{HttpPool, PoolOptions, DEFAULT_BASE_PATH, DEFAULT_REPLICAS};
pub use server::{create_peer_router, parse_peer_path, peer_handler, PeerServerState};

// == Peer Getter ==
/// Fetches a value from one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, request: &PeerRequest) -> Result<PeerResponse>;
}

// == Peer Picker ==
/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the owning peer, or None when the key belongs to this node
    /// or no peers are known.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}
