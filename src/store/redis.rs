use async_trait::async_trait;
use ::redis::{ AsyncCommands, Client };
use serde_json::Value;

use super::{ KeyValueStore, StoreError };

/// One Redis string per key, JSON encoded, under a shared prefix.
pub struct RedisStore {
    client: Client,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<::redis::aio::MultiplexedConnection, ::redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.get_connection().await?;
        let raw: Option<String> = conn.get(self.full_key(key)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(&value)?;
        conn.set::<_, _, ()>(self.full_key(key), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        let store = RedisStore::new("redis://127.0.0.1:6379", "multi-ai:").unwrap();
        assert_eq!(store.full_key("conversation_history"), "multi-ai:conversation_history");
    }

    #[test]
    fn rejects_bad_url() {
        assert!(matches!(RedisStore::new("not a url", "p:"), Err(StoreError::Redis(_))));
    }
}
