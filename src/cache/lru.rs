//! LRU Cache Module
//!
//! Byte-budgeted Least Recently Used cache.

use std::collections::HashMap;
use std::fmt;

use crate::cache::ByteSize;

/// Callback invoked with every entry that leaves the cache.
pub type EvictCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

// == Node ==
/// One slot of the recency list.
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<V: ByteSize> Node<V> {
    fn size(&self) -> usize {
        self.key.len() + self.value.byte_size()
    }
}

// == LRU Cache ==
/// Key-value cache bounded by total bytes.
///
/// Entries live in a slab of slots linked by index:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// An entry costs `key.len() + value.byte_size()` bytes. After every `add`
/// the tail is evicted until the cache fits its budget again, which can
/// include the entry that was just added.
pub struct LruCache<V> {
    /// Byte budget
    max_bytes: usize,
    /// Bytes currently held
    used_bytes: usize,
    /// Slot storage, `None` for free slots
    slots: Vec<Option<Node<V>>>,
    /// Indices of free slots
    free: Vec<usize>,
    /// Key to slot index
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    on_evicted: Option<EvictCallback<V>>,
}

impl<V: ByteSize> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_bytes` bytes.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            on_evicted: None,
        }
    }

    /// Creates an empty cache that reports evicted and removed entries to `on_evicted`.
    pub fn with_eviction_callback(max_bytes: usize, on_evicted: EvictCallback<V>) -> Self {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(on_evicted);
        cache
    }

    // == Get ==
    /// Looks up a key and marks it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.unlink(idx);
        self.push_front(idx);
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    // == Add ==
    /// Inserts or updates an entry, then evicts until the budget holds.
    ///
    /// Returns the number of entries evicted.
    pub fn add(&mut self, key: impl Into<String>, value: V) -> usize {
        let key = key.into();

        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.slots[idx].as_mut() {
                self.used_bytes -= node.value.byte_size();
                self.used_bytes += value.byte_size();
                node.value = value;
            }
            self.unlink(idx);
            self.push_front(idx);
        } else {
            let node = Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            self.used_bytes += node.size();
            let idx = match self.free.pop() {
                Some(idx) => {
                    self.slots[idx] = Some(node);
                    idx
                }
                None => {
                    self.slots.push(Some(node));
                    self.slots.len() - 1
                }
            };
            self.index.insert(key, idx);
            self.push_front(idx);
        }

        let mut evicted = 0;
        while self.used_bytes > self.max_bytes {
            if !self.remove_oldest() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    // == Remove ==
    /// Removes a key, reporting it to the eviction callback.
    ///
    /// Returns false if the key was absent.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        self.remove_slot(idx);
        true
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry.
    ///
    /// Returns false if the cache is empty.
    pub fn remove_oldest(&mut self) -> bool {
        match self.tail {
            Some(idx) => {
                self.remove_slot(idx);
                true
            }
            None => false,
        }
    }

    // == Length ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the bytes currently held.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Iterates keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.slots[cursor?].as_ref()?;
            cursor = node.next;
            Some(node.key.as_str())
        })
    }

    fn remove_slot(&mut self, idx: usize) {
        self.unlink(idx);
        if let Some(node) = self.slots[idx].take() {
            self.index.remove(&node.key);
            self.used_bytes -= node.size();
            self.free.push(idx);
            if let Some(callback) = self.on_evicted.as_mut() {
                callback(&node.key, &node.value);
            }
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None if self.head == Some(idx) => self.head = next,
            None => {}
        }

        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None if self.tail == Some(idx) => self.tail = prev,
            None => {}
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.slots[h].as_mut() {
                node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_cache(max_bytes: usize) -> (LruCache<String>, Arc<Mutex<Vec<String>>>) {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let cache = LruCache::with_eviction_callback(
            max_bytes,
            Box::new(move |key: &str, _: &String| sink.lock().unwrap().push(key.to_string())),
        );
        (cache, evicted)
    }

    #[test]
    fn test_lru_new() {
        let lru: LruCache<String> = LruCache::new(64);
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.used_bytes(), 0);
    }

    #[test]
    fn test_lru_get_hit_and_miss() {
        let mut lru = LruCache::new(64);
        lru.add("key1", "1234".to_string());

        assert_eq!(lru.get("key1").map(String::as_str), Some("1234"));
        assert!(lru.get("key2").is_none());
    }

    #[test]
    fn test_lru_remove_oldest_on_overflow() {
        let (k1, k2, k3) = ("key1", "key2", "key3");
        let (v1, v2, v3) = ("value1", "value2", "value3");
        let capacity = k1.len() + k2.len() + v1.len() + v2.len();

        let mut lru = LruCache::new(capacity);
        lru.add(k1, v1.to_string());
        lru.add(k2, v2.to_string());
        lru.add(k3, v3.to_string());

        assert!(lru.get(k1).is_none());
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_eviction_callback_order() {
        let (mut lru, evicted) = recording_cache(10);

        lru.add("k1", "value1".to_string());
        lru.add("k2", "value2".to_string());
        lru.add("k3", "value3".to_string());

        assert_eq!(*evicted.lock().unwrap(), vec!["k1", "k2"]);
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_get_protects_from_eviction() {
        let mut lru = LruCache::new(30);

        lru.add("a", "123456789".to_string());
        lru.add("b", "123456789".to_string());
        lru.add("c", "123456789".to_string());

        // Touch 'a' so 'b' becomes oldest
        lru.get("a");
        lru.add("d", "123456789".to_string());

        assert!(lru.get("a").is_some());
        assert!(lru.get("b").is_none());
        assert_eq!(lru.keys().collect::<Vec<_>>(), vec!["d", "a", "c"]);
    }

    #[test]
    fn test_lru_update_adjusts_bytes() {
        let mut lru = LruCache::new(100);

        lru.add("key", "short".to_string());
        assert_eq!(lru.used_bytes(), 3 + 5);

        lru.add("key", "much longer value".to_string());
        assert_eq!(lru.used_bytes(), 3 + 17);
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.get("key").map(String::as_str), Some("much longer value"));
    }

    #[test]
    fn test_lru_update_moves_to_front() {
        let mut lru = LruCache::new(100);

        lru.add("a", "1".to_string());
        lru.add("b", "2".to_string());
        lru.add("a", "3".to_string());

        assert_eq!(lru.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_lru_oversized_entry_evicts_itself() {
        let (mut lru, evicted) = recording_cache(8);

        lru.add("k", "1234".to_string());
        let count = lru.add("big", "0123456789".to_string());

        assert_eq!(count, 2);
        assert!(lru.is_empty());
        assert_eq!(lru.used_bytes(), 0);
        assert_eq!(*evicted.lock().unwrap(), vec!["k", "big"]);
    }

    #[test]
    fn test_lru_remove_invokes_callback() {
        let (mut lru, evicted) = recording_cache(100);

        lru.add("key1", "value1".to_string());
        lru.add("key2", "value2".to_string());

        assert!(lru.remove("key1"));
        assert!(!lru.remove("nonexistent"));

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.used_bytes(), 10);
        assert_eq!(*evicted.lock().unwrap(), vec!["key1"]);
    }

    #[test]
    fn test_lru_slots_are_reused() {
        let mut lru = LruCache::new(12);

        for i in 0..50 {
            lru.add(format!("k{}", i % 10), "1234".to_string());
        }

        assert!(lru.slots.len() <= 3);
        assert!(lru.used_bytes() <= 12);
    }

    #[test]
    fn test_lru_remove_oldest_empty() {
        let mut lru: LruCache<String> = LruCache::new(10);
        assert!(!lru.remove_oldest());
    }
}
