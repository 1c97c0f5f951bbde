//! Group Module
//!
//! A group is a named cache namespace: a local byte-budgeted cache, a loader
//! for the source of truth, and optionally a set of peers sharing the key
//! space. Lookups go local cache, then owning peer, then loader.

mod getter;
mod registry;
mod stats;

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::cache::{ByteView, CacheStats, CacheStore};
use crate::dedup::CallDeduplicator;
use crate::error::{CacheError, ConfigError, Result};
use crate::models::PeerRequest;
use crate::peer::{PeerGetter, PeerPicker};

pub use getter::{Getter, GetterFn};
pub use registry::GroupRegistry;
pub use stats::{GroupStats, GroupStatsSnapshot};

/// Byte budget used when a builder is not given one.
pub const DEFAULT_CACHE_BYTES: usize = 2 << 10;

// == Group ==
/// Named read-through cache.
pub struct Group {
    name: String,
    getter: Arc<dyn Getter>,
    main_cache: CacheStore,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    /// Ensures each key is loaded once at a time, locally or remotely
    loader: CallDeduplicator<Result<ByteView>>,
    stats: GroupStats,
}

impl Group {
    /// Starts building a group named `name`.
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder {
            name: name.into(),
            cache_bytes: DEFAULT_CACHE_BYTES,
            getter: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Get ==
    /// Returns the value for `key`.
    ///
    /// Served from the local cache when present. Otherwise a single load
    /// runs per key no matter how many callers ask concurrently: the owning
    /// peer is asked first, and the loader runs if there is no such peer or
    /// the peer fails. Only values produced by the loader are cached here.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        self.stats.record_get();

        if let Some(value) = self.main_cache.get(key) {
            debug!("[Cache {}] hit {}", self.name, key);
            self.stats.record_cache_hit();
            return Ok(value);
        }

        self.load(key).await
    }

    // == Register Peers ==
    /// Attaches the peer picker used to locate the owner of a key.
    ///
    /// A group accepts exactly one picker; a second call is an error.
    pub fn register_peers(
        &self,
        peers: Arc<dyn PeerPicker>,
    ) -> std::result::Result<(), ConfigError> {
        self.peers
            .set(peers)
            .map_err(|_| ConfigError::PeersAlreadyRegistered(self.name.clone()))
    }

    /// Returns the group's counters.
    pub fn stats(&self) -> GroupStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the local cache's statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.main_cache.stats()
    }

    pub(crate) fn record_server_request(&self) {
        self.stats.record_server_request();
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        self.loader
            .run(key, || async {
                self.stats.record_load();

                if let Some(peer) = self.peers.get().and_then(|peers| peers.pick_peer(key)) {
                    match self.get_from_peer(peer.as_ref(), key).await {
                        Ok(value) => {
                            self.stats.record_peer_load();
                            return Ok(value);
                        }
                        Err(err) => {
                            self.stats.record_peer_error();
                            warn!("[Cache {}] failed to get {} from peer: {}", self.name, key, err);
                        }
                    }
                }

                self.get_locally(key).await
            })
            .await
    }

    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let request = PeerRequest {
            group: self.name.clone(),
            key: key.to_string(),
        };
        let response = peer.get(&request).await?;
        Ok(ByteView::from(response.value))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        info!("[Cache {}] loading {} from source", self.name, key);
        let bytes = match self.getter.get(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.stats.record_local_load_error();
                return Err(CacheError::Loader(format!("{:#}", err)));
            }
        };

        self.stats.record_local_load();
        // The loader hands over ownership, so the view cannot alias its buffer
        let value = ByteView::from(bytes);
        self.main_cache.add(key, value.clone());
        Ok(value)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("main_cache", &self.main_cache)
            .field("has_peers", &self.peers.get().is_some())
            .finish()
    }
}

// == Group Builder ==
/// Configures a [`Group`] and registers it.
pub struct GroupBuilder {
    name: String,
    cache_bytes: usize,
    getter: Option<Arc<dyn Getter>>,
}

impl GroupBuilder {
    /// Sets the byte budget of the group's local cache.
    pub fn cache_bytes(mut self, cache_bytes: usize) -> Self {
        self.cache_bytes = cache_bytes;
        self
    }

    /// Sets the loader invoked on a full miss.
    pub fn getter(mut self, getter: impl Getter + 'static) -> Self {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Sets a loader that is already shared.
    pub fn shared_getter(mut self, getter: Arc<dyn Getter>) -> Self {
        self.getter = Some(getter);
        self
    }

    // == Register ==
    /// Builds the group and registers it under its name.
    ///
    /// Fails if no loader was set or the name is already registered.
    pub fn register(
        self,
        registry: &GroupRegistry,
    ) -> std::result::Result<Arc<Group>, ConfigError> {
        let getter = self
            .getter
            .ok_or_else(|| ConfigError::MissingLoader(self.name.clone()))?;

        let group = Arc::new(Group {
            main_cache: CacheStore::new(self.cache_bytes),
            name: self.name,
            getter,
            peers: OnceLock::new(),
            loader: CallDeduplicator::new(),
            stats: GroupStats::default(),
        });
        registry.insert(Arc::clone(&group))?;
        Ok(group)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PeerResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::task::JoinSet;

    /// Loader over a fixed map that counts its invocations
    struct SlowDb {
        data: HashMap<&'static str, &'static str>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl SlowDb {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                data: HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]),
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Getter for SlowDb {
        async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.data.get(key) {
                Some(v) => Ok(v.as_bytes().to_vec()),
                None => anyhow::bail!("{} not exist", key),
            }
        }
    }

    /// Peer that serves a fixed value or always fails
    struct FakePeer {
        value: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PeerGetter for FakePeer {
        async fn get(&self, request: &PeerRequest) -> Result<PeerResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.group, "scores");
            match self.value {
                Some(v) => Ok(PeerResponse {
                    value: v.as_bytes().to_vec(),
                }),
                None => Err(CacheError::Transport("server returned: 503".to_string())),
            }
        }
    }

    struct StaticPicker(Option<Arc<FakePeer>>);

    impl PeerPicker for StaticPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
            self.0.clone().map(|peer| peer as Arc<dyn PeerGetter>)
        }
    }

    fn scores_group(db: &Arc<SlowDb>) -> Arc<Group> {
        Group::builder("scores")
            .cache_bytes(2 << 10)
            .shared_getter(Arc::clone(db) as Arc<dyn Getter>)
            .register(&GroupRegistry::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_loads_then_caches() {
        let db = SlowDb::new(Duration::ZERO);
        let group = scores_group(&db);

        for _ in 0..3 {
            let value = group.get("Tom").await.unwrap();
            assert_eq!(value.to_string(), "630");
        }

        assert_eq!(db.calls(), 1);
        let stats = group.stats();
        assert_eq!(stats.gets, 3);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.local_loads, 1);
        assert_eq!(group.cache_stats().total_entries, 1);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let db = SlowDb::new(Duration::ZERO);
        let group = scores_group(&db);
        group.register_peers(Arc::new(StaticPicker(None))).unwrap();

        assert_eq!(group.get("").await, Err(CacheError::EmptyKey));
        assert_eq!(db.calls(), 0);
        assert_eq!(group.cache_stats().misses, 0);
        assert_eq!(group.stats(), GroupStatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_loader_error_propagates_and_is_not_cached() {
        let db = SlowDb::new(Duration::ZERO);
        let group = scores_group(&db);

        for _ in 0..2 {
            let err = group.get("unknown").await.unwrap_err();
            assert_eq!(err, CacheError::Loader("unknown not exist".to_string()));
        }

        assert_eq!(db.calls(), 2);
        assert_eq!(group.stats().local_load_errors, 2);
        assert_eq!(group.cache_stats().total_entries, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_load_once() {
        let db = SlowDb::new(Duration::from_millis(100));
        let group = scores_group(&db);
        let mut tasks = JoinSet::new();

        for _ in 0..20 {
            let group = Arc::clone(&group);
            tasks.spawn(async move { group.get("Jack").await });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().as_slice(), b"589");
        }
        assert_eq!(db.calls(), 1);
        assert_eq!(group.stats().loads, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_share_error() {
        let db = SlowDb::new(Duration::from_millis(100));
        let group = scores_group(&db);
        let mut tasks = JoinSet::new();

        for _ in 0..10 {
            let group = Arc::clone(&group);
            tasks.spawn(async move { group.get("ghost").await });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(
                result.unwrap(),
                Err(CacheError::Loader("ghost not exist".to_string()))
            );
        }
        assert_eq!(db.calls(), 1);
    }

    #[tokio::test]
    async fn test_peer_value_is_passed_through() {
        let db = SlowDb::new(Duration::ZERO);
        let group = scores_group(&db);
        let peer = Arc::new(FakePeer {
            value: Some("remote"),
            calls: AtomicUsize::new(0),
        });
        group
            .register_peers(Arc::new(StaticPicker(Some(Arc::clone(&peer)))))
            .unwrap();

        assert_eq!(group.get("Tom").await.unwrap().to_string(), "remote");
        assert_eq!(group.get("Tom").await.unwrap().to_string(), "remote");

        // Remote values are not cached by the requesting node
        assert_eq!(peer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(db.calls(), 0);
        assert!(group.main_cache.is_empty());
        assert_eq!(group.stats().peer_loads, 2);
    }

    #[tokio::test]
    async fn test_peer_failure_falls_back_to_loader() {
        let db = SlowDb::new(Duration::ZERO);
        let group = scores_group(&db);
        let peer = Arc::new(FakePeer {
            value: None,
            calls: AtomicUsize::new(0),
        });
        group
            .register_peers(Arc::new(StaticPicker(Some(Arc::clone(&peer)))))
            .unwrap();

        assert_eq!(group.get("Sam").await.unwrap().to_string(), "567");
        assert_eq!(peer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(db.calls(), 1);

        // Loaded locally, so now cached locally
        assert_eq!(group.get("Sam").await.unwrap().to_string(), "567");
        assert_eq!(peer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.stats().peer_errors, 1);
    }

    #[tokio::test]
    async fn test_peer_failure_then_loader_failure_surfaces_loader_error() {
        let db = SlowDb::new(Duration::ZERO);
        let group = scores_group(&db);
        let peer = Arc::new(FakePeer {
            value: None,
            calls: AtomicUsize::new(0),
        });
        group
            .register_peers(Arc::new(StaticPicker(Some(peer))))
            .unwrap();

        let err = group.get("nobody").await.unwrap_err();
        assert_eq!(err, CacheError::Loader("nobody not exist".to_string()));
    }

    #[test]
    fn test_register_peers_twice_fails() {
        let db = SlowDb::new(Duration::ZERO);
        let group = scores_group(&db);

        assert!(group.register_peers(Arc::new(StaticPicker(None))).is_ok());
        let err = group
            .register_peers(Arc::new(StaticPicker(None)))
            .unwrap_err();
        assert_eq!(err, ConfigError::PeersAlreadyRegistered("scores".to_string()));
    }

    #[test]
    fn test_missing_loader_fails() {
        let registry = GroupRegistry::new();
        let err = Group::builder("scores").register(&registry).unwrap_err();

        assert_eq!(err, ConfigError::MissingLoader("scores".to_string()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_small_cache_evicts_older_keys() {
        let db = SlowDb::new(Duration::ZERO);
        // "Tom" + "630" = 6 bytes, room for one entry only
        let group = Group::builder("scores")
            .cache_bytes(6)
            .shared_getter(Arc::clone(&db) as Arc<dyn Getter>)
            .register(&GroupRegistry::new())
            .unwrap();

        group.get("Tom").await.unwrap();
        group.get("Sam").await.unwrap();
        group.get("Tom").await.unwrap();

        assert_eq!(db.calls(), 3);
        assert_eq!(group.cache_stats().evictions, 2);
    }
}
