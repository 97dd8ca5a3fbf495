use async_trait::async_trait;
use log::debug;
use serde_json::{ Map, Value };
use std::io::{ self, Write };
use std::path::{ Path, PathBuf };
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use super::{ KeyValueStore, StoreError };

/// Single JSON object on disk holding every key.
///
/// Each `set` rewrites the whole file through a sibling temp file and an
/// atomic rename, so a crash mid-write leaves the previous contents intact.
/// Writes are serialized by the map lock, which is held until the rename
/// completes.
pub struct FileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(e.into());
            }
        };
        debug!("Opened store {} with {} keys", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        let mut next = values.clone();
        next.insert(key.to_string(), value);

        let bytes = serde_json::to_vec_pretty(&next)?;
        let path = self.path.clone();
        tokio::task
            ::spawn_blocking(move || write_atomically(&path, &bytes)).await
            .map_err(io::Error::other)??;

        *values = next;
        Ok(())
    }
}
