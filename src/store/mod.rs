use std::time::Duration;

use async_trait::async_trait;

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::RedisError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Contract for the ephemeral shared state backing presence markers and
/// dashboard cache keys.
///
/// Any conforming backend works: the production deployment uses redis so
/// multiple instances agree on liveness, a single instance (and the test
/// harness) can run on the in-process implementation instead. Failures
/// never gate the core flows, callers treat every operation as
/// best-effort.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Set a key, optionally with a time-to-live. Overwrites any previous
    /// value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Batched get for many keys in a single round trip. The result is
    /// positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn del(&self, key: &str) -> Result<(), StoreError>;
}
