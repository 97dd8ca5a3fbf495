mod file;
mod memory;
mod redis;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use log::info;
use serde::{ de::DeserializeOwned, Serialize };
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;

pub const CONVERSATION_KEY: &str = "conversation_history";
pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Unsupported store type: {0}")]
    UnsupportedType(String),
}

/// String-keyed persistent values. Last write wins; a completed `set` is
/// visible to the next `get`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(value)?).await
}

pub fn default_store_path() -> PathBuf {
    directories::ProjectDirs
        ::from("", "", "multi-ai")
        .map(|dirs| dirs.data_dir().join("store.json"))
        .unwrap_or_else(|| PathBuf::from("multi-ai-store.json"))
}

pub async fn create_store(args: &Args) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match args.store_type.to_lowercase().as_str() {
        "file" => {
            let path = args.store_path.clone().unwrap_or_else(default_store_path);
            info!("Persistence: JSON file at {}", path.display());
            Ok(Arc::new(FileStore::open(path).await?))
        }
        "redis" => {
            info!("Persistence: Redis at {}", args.store_redis_url);
            let store = RedisStore::new(&args.store_redis_url, &args.store_redis_prefix)?;
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("Persistence: in-memory only, nothing survives exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}
