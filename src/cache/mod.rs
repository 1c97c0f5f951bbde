//! Cache Module
//!
//! Provides the byte-budgeted LRU cache each group keeps locally.

mod byteview;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use lru::{EvictCallback, LruCache};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Byte Size ==
/// Values that report how many bytes they occupy in the cache.
pub trait ByteSize {
    fn byte_size(&self) -> usize;
}

impl ByteSize for String {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl ByteSize for Vec<u8> {
    fn byte_size(&self) -> usize {
        self.len()
    }
}
