use std::time::Duration;

use async_trait::async_trait;
use fred::clients::RedisClient;
use fred::interfaces::{ClientLike, KeysInterface};
use fred::types::{Expiration, RedisConfig};

use super::{KeyValueStore, StoreError};

/// Redis backed [`KeyValueStore`].
pub struct RedisStore {
    client: RedisClient,
}

impl RedisStore {
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let config = RedisConfig::from_url(uri)?;
        let client = RedisClient::new(config, None, None, None);

        client.connect();
        client.wait_for_connect().await?;

        Ok(Self { client })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expire = ttl.map(|ttl| Expiration::EX(ttl.as_secs() as i64));
        self.client
            .set::<(), _, _>(key, value, expire, None, false)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.client.get::<Option<String>, _>(key).await?)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .client
            .mget::<Vec<Option<String>>, _>(keys.to_vec())
            .await?)
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.client.del::<u64, _>(key).await?;
        Ok(())
    }
}
