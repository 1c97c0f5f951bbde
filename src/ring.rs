//! Consistent Hash Ring
//!
//! Maps keys onto a set of peers so that every node holding the same peer
//! list agrees on each key's owner, and adding a peer only moves the keys
//! that land on its virtual nodes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hash function placing keys and virtual nodes on the ring.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

// == Hash Ring ==
/// Consistent hash ring with a fixed number of virtual nodes per peer.
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    /// Virtual nodes per peer
    replicas: usize,
    /// Sorted virtual node hashes
    ring: Vec<u32>,
    /// Virtual node hash to peer
    owners: HashMap<u32, String>,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring. `hash` defaults to CRC-32 (IEEE).
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or_else(|| Arc::new(crc32fast::hash) as HashFn),
            replicas,
            ring: Vec::new(),
            owners: HashMap::new(),
        }
    }

    // == Add ==
    /// Places `replicas` virtual nodes for each peer on the ring.
    ///
    /// Adding a peer that is already present places a second set of
    /// virtual nodes; callers replacing the peer set build a new ring.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let vnode = (self.hash)(format!("{}{}", i, peer).as_bytes());
                self.ring.push(vnode);
                self.owners.insert(vnode, peer.to_string());
            }
        }
        self.ring.sort_unstable();
    }

    // == Get ==
    /// Returns the peer owning `key`, or None on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        // First virtual node at or after the key, wrapping to the start
        let idx = self.ring.partition_point(|&vnode| vnode < hash) % self.ring.len();
        self.owners.get(&self.ring[idx]).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns the number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("virtual_nodes", &self.ring.len())
            .finish()
    }
}
