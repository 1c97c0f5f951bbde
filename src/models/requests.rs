//! Request DTOs for the front-end API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string for the lookup endpoint (GET /api?key=...)
///
/// A missing `key` deserializes to an empty key, which the group rejects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiQuery {
    /// The cache key
    #[serde(default)]
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_query_deserialize() {
        let query: ApiQuery = serde_json::from_str(r#"{"key": "Tom"}"#).unwrap();
        assert_eq!(query.key, "Tom");
    }

    #[test]
    fn test_api_query_missing_key() {
        let query: ApiQuery = serde_json::from_str("{}").unwrap();
        assert!(query.key.is_empty());
    }
}
