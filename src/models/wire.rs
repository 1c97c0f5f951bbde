//! Peer-to-peer wire messages.

use serde::{Deserialize, Serialize};

/// Identifies the value one node asks another for.
///
/// Carried in the request path rather than a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRequest {
    pub group: String,
    pub key: String,
}

/// Body of a successful peer response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerResponse {
    pub value: Vec<u8>,
}
