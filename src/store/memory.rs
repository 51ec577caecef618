use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{KeyValueStore, StoreError};
use crate::context::Context;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}

/// In-process [`KeyValueStore`] with TTL expiry.
///
/// Expired entries are dropped lazily on access; the sweeper task reclaims
/// keys that are never read again (abandoned presence markers mostly).
pub struct MemoryStore {
    map: DashMap<String, Entry>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            map: DashMap::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entry = self.map.get(key)?;
        if entry.is_expired(now) {
            drop(entry);
            self.map.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn sweep(&self) {
        let now = Instant::now();
        self.map.retain(|_, entry| !entry.is_expired(now));
    }

    /// Periodically sweeps expired entries until the context is done.
    pub fn spawn_sweeper(store: Arc<Self>, ctx: Context) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                tokio::select! {
                    _ = interval.tick() => store.sweep(),
                    _ = ctx.done() => break,
                }
            }
        });
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.map.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read(key))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        Ok(keys.iter().map(|key| self.read(key)).collect())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }
}
