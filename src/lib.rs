//! gcache - A distributed read-through cache
//!
//! Each node owns a slice of the key space by consistent hashing. Lookups
//! for keys owned elsewhere are fetched from the owning peer over HTTP, and
//! concurrent loads of the same key are collapsed into one.

pub mod api;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod group;
pub mod models;
pub mod peer;
pub mod ring;

pub use api::ApiState;
pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, ConfigError};
pub use group::{Getter, GetterFn, Group, GroupRegistry};
pub use peer::{create_peer_router, HttpPool, PoolOptions};
