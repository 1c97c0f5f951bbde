//! Authoritative loader capability.

use std::future::Future;

use async_trait::async_trait;

// == Getter ==
/// Loads a key from the source of truth on a full cache miss.
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

// == Getter Function Adapter ==
/// Adapts an async closure into a [`Getter`].
///
/// # Example
/// ```ignore
/// let getter = GetterFn::new(|key: String| async move {
///     db_lookup(&key).await
/// });
/// ```
pub struct GetterFn<F>(F);

impl<F> GetterFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Getter for GetterFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send,
{
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key.to_string()).await
    }
}
