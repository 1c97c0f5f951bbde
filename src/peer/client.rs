//! HTTP client side of the peer protocol.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::StatusCode;

use crate::error::{CacheError, Result};
use crate::models::{PeerRequest, PeerResponse};
use crate::peer::PeerGetter;

// == HTTP Getter ==
/// Fetches values from a single peer over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    /// Peer address joined with the base path, e.g. `http://localhost:8001/_gcache/`
    base_url: String,
    client: reqwest::Client,
}

impl HttpGetter {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the request URL for a group and key.
    pub fn url_for(&self, group: &str, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            utf8_percent_encode(group, NON_ALPHANUMERIC),
            utf8_percent_encode(key, NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, request: &PeerRequest) -> Result<PeerResponse> {
        let url = self.url_for(&request.group, &request.key);

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CacheError::Transport(format!("requesting {}: {}", url, e)))?;

        if res.status() != StatusCode::OK {
            return Err(CacheError::Transport(format!(
                "server returned: {}",
                res.status()
            )));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| CacheError::Transport(format!("reading response body: {}", e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| CacheError::Transport(format!("decoding response body: {}", e)))
    }
}
