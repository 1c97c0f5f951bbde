//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;

use crate::group::DEFAULT_CACHE_BYTES;
use crate::peer::{normalize_addr, PoolOptions, DEFAULT_BASE_PATH, DEFAULT_REPLICAS};

const DEFAULT_SERVER_PORT: u16 = 8001;
const DEFAULT_GROUP_NAME: &str = "scores";

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the peer server binds on
    pub server_port: u16,
    /// This node's base URL as it appears in the peer list
    pub self_addr: String,
    /// Base URLs of every node in the cluster, this one included
    pub peers: Vec<String>,
    /// Port for the front-end API, not started when None
    pub api_port: Option<u16>,
    /// Byte budget of the served group's cache
    pub cache_bytes: usize,
    /// Name of the served group
    pub group_name: String,
    /// Path prefix for peer requests
    pub base_path: String,
    /// Virtual nodes per peer on the hash ring
    pub replicas: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Peer server port (default: 8001)
    /// - `SELF_ADDR` - This node's URL (default: `http://localhost:<SERVER_PORT>`)
    /// - `PEERS` - Comma separated node URLs (default: `SELF_ADDR`)
    /// - `API_PORT` - Front-end API port (default: unset, API disabled)
    /// - `CACHE_BYTES` - Group cache budget in bytes (default: 2048)
    /// - `GROUP_NAME` - Served group (default: scores)
    /// - `BASE_PATH` - Peer path prefix (default: /_gcache/)
    /// - `REPLICAS` - Virtual nodes per peer (default: 50)
    pub fn from_env() -> Self {
        let server_port = parse_var("SERVER_PORT").unwrap_or(DEFAULT_SERVER_PORT);
        let self_addr = env::var("SELF_ADDR")
            .ok()
            .map(|v| normalize_addr(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| local_addr(server_port));
        let peers = env::var("PEERS")
            .ok()
            .map(|v| parse_peers(&v))
            .filter(|peers| !peers.is_empty())
            .unwrap_or_else(|| vec![self_addr.clone()]);

        Self {
            server_port,
            self_addr,
            peers,
            api_port: parse_var("API_PORT"),
            cache_bytes: parse_var("CACHE_BYTES").unwrap_or(DEFAULT_CACHE_BYTES),
            group_name: env::var("GROUP_NAME").unwrap_or_else(|_| DEFAULT_GROUP_NAME.to_string()),
            base_path: env::var("BASE_PATH").unwrap_or_else(|_| DEFAULT_BASE_PATH.to_string()),
            replicas: parse_var("REPLICAS").unwrap_or(DEFAULT_REPLICAS),
        }
    }

    /// Pool options derived from this config, default hash.
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            base_path: self.base_path.clone(),
            replicas: self.replicas,
            hash: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let self_addr = local_addr(DEFAULT_SERVER_PORT);
        Self {
            server_port: DEFAULT_SERVER_PORT,
            peers: vec![self_addr.clone()],
            self_addr,
            api_port: None,
            cache_bytes: DEFAULT_CACHE_BYTES,
            group_name: DEFAULT_GROUP_NAME.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn local_addr(port: u16) -> String {
    format!("http://localhost:{}", port)
}

/// Splits a comma separated peer list, dropping blanks and trailing slashes.
fn parse_peers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_addr)
        .filter(|p| !p.is_empty())
        .collect()
}
