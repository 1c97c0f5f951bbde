//! HTTP Peer Pool
//!
//! Tracks the current peer set and picks the owner of each key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::peer::{HttpGetter, PeerGetter, PeerPicker};
use crate::ring::{HashFn, HashRing};

/// Path prefix under which peers serve each other.
pub const DEFAULT_BASE_PATH: &str = "/_gcache/";

/// Virtual nodes per peer on the hash ring.
pub const DEFAULT_REPLICAS: usize = 50;

// == Pool Options ==
/// Tunables shared by every node of a cluster.
///
/// All nodes must agree on these for their rings to agree.
#[derive(Clone)]
pub struct PoolOptions {
    pub base_path: String,
    pub replicas: usize,
    /// Ring hash, CRC-32 (IEEE) when None
    pub hash: Option<HashFn>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            hash: None,
        }
    }
}

impl fmt::Debug for PoolOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolOptions")
            .field("base_path", &self.base_path)
            .field("replicas", &self.replicas)
            .field("custom_hash", &self.hash.is_some())
            .finish()
    }
}

/// Ring and clients for one peer set, replaced together.
struct PeerSet {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

// == HTTP Pool ==
/// Peer picker over HTTP peers, and the server half of the protocol.
pub struct HttpPool {
    /// This node's address as it appears in the peer list, e.g. `http://localhost:8001`
    self_addr: String,
    base_path: String,
    replicas: usize,
    hash: Option<HashFn>,
    client: reqwest::Client,
    peers: Mutex<PeerSet>,
}

impl HttpPool {
    // == Constructor ==
    /// Creates a pool for the node at `self_addr` with default options.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self::with_options(self_addr, PoolOptions::default())
    }

    pub fn with_options(self_addr: impl Into<String>, options: PoolOptions) -> Self {
        let self_addr: String = self_addr.into();
        let base_path = normalize_base_path(&options.base_path);
        Self {
            self_addr: normalize_addr(&self_addr),
            base_path,
            replicas: options.replicas,
            peers: Mutex::new(PeerSet {
                ring: HashRing::new(options.replicas, options.hash.clone()),
                getters: HashMap::new(),
            }),
            hash: options.hash,
            client: reqwest::Client::new(),
        }
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    // == Set ==
    /// Replaces the peer set. Peers from earlier calls are forgotten.
    ///
    /// The list should include this node's own address so that it owns
    /// its share of the keys.
    pub fn set<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers
            .into_iter()
            .map(|p| normalize_addr(p.as_ref()))
            .collect();

        let mut ring = HashRing::new(self.replicas, self.hash.clone());
        ring.add(&peers);
        let getters = peers
            .iter()
            .map(|peer| {
                let getter = HttpGetter::new(format!("{}{}", peer, self.base_path), self.client.clone());
                (peer.clone(), Arc::new(getter))
            })
            .collect();

        *self.peers.lock() = PeerSet { ring, getters };
        info!("[Server {}] peer set: {:?}", self.self_addr, peers);
    }

    /// Returns the address owning `key`, which may be this node.
    ///
    /// Addresses come back without a trailing `/`.
    pub fn owner(&self, key: &str) -> Option<String> {
        self.peers.lock().ring.get(key).map(str::to_string)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let peers = self.peers.lock();
        let peer = peers.ring.get(key).filter(|peer| *peer != self.self_addr)?;
        debug!("[Server {}] Pick peer {}", self.self_addr, peer);
        peers
            .getters
            .get(peer)
            .map(|getter| Arc::clone(getter) as Arc<dyn PeerGetter>)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("base_path", &self.base_path)
            .field("replicas", &self.replicas)
            .finish()
    }
}

/// Trims whitespace and trailing `/` so that spellings of one address match.
pub(crate) fn normalize_addr(addr: &str) -> String {
    addr.trim().trim_end_matches('/').to_string()
}

/// Ensures the base path starts and ends with `/`.
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
