//! In-memory storage engine.
//!
//! Same semantics as [`RocksDbStorage`](crate::RocksDbStorage): sorted buckets, one writer
//! at a time, scans over a point-in-time copy. Nothing survives the process.

use crate::{
    column_families::all_column_families,
    errors::{Result, StorageError},
    traits::{deserialize_value, serialize_key, serialize_value, within_bound, Batch, Storage},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

type Buckets = HashMap<String, BTreeMap<Vec<u8>, Vec<u8>>>;

/// In-memory storage implementation
pub struct MemoryStorage {
    buckets: Arc<RwLock<Buckets>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStorage {
    /// Create an empty store with every column family present
    pub fn new() -> Self {
        let buckets = all_column_families()
            .into_iter()
            .map(|cf| (cf.to_string(), BTreeMap::new()))
            .collect();

        Self {
            buckets: Arc::new(RwLock::new(buckets)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    fn read_raw(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        read_bucket(&self.buckets, cf, key)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn read_bucket(buckets: &RwLock<Buckets>, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
    let buckets = buckets.read();
    let bucket = buckets
        .get(cf)
        .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;
    Ok(bucket.get(key).cloned())
}

fn check_bucket(buckets: &RwLock<Buckets>, cf: &str) -> Result<()> {
    if buckets.read().contains_key(cf) {
        Ok(())
    } else {
        Err(StorageError::InvalidColumnFamily(cf.to_string()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let key_bytes = serialize_key(key)?;
        self.read_raw(cf, &key_bytes)?
            .map(|bytes| deserialize_value(&bytes))
            .transpose()
    }

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let mut batch = self.begin_transaction().await?;
        batch.put_raw(cf, serialize_key(key)?, serialize_value(value)?)?;
        batch.commit().await
    }

    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync,
    {
        let mut batch = self.begin_transaction().await?;
        batch.delete_raw(cf, serialize_key(key)?)?;
        batch.commit().await
    }

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        Ok(self.read_raw(cf, &key_bytes)?.is_some())
    }

    async fn scan_until<V>(&self, cf: &str, bound: &[u8]) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned,
    {
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = {
            let buckets = self.buckets.read();
            let bucket = buckets
                .get(cf)
                .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;
            bucket
                .iter()
                .take_while(|(key, _)| within_bound(key, bound))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        };

        snapshot
            .into_iter()
            .map(|(key, value)| Ok((key, deserialize_value(&value)?)))
            .collect()
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Batch>> {
        let guard = Arc::clone(&self.writer).lock_owned().await;

        Ok(Box::new(MemoryBatch {
            buckets: Arc::clone(&self.buckets),
            operations: Vec::new(),
            _writer: guard,
        }))
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

enum Operation {
    Put {
        cf: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: String,
        key: Vec<u8>,
    },
}

/// In-memory batch implementation
pub struct MemoryBatch {
    buckets: Arc<RwLock<Buckets>>,
    operations: Vec<Operation>,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl Batch for MemoryBatch {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        check_bucket(&self.buckets, cf)?;
        self.operations.push(Operation::Put {
            cf: cf.to_string(),
            key,
            value,
        });
        Ok(())
    }

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()> {
        check_bucket(&self.buckets, cf)?;
        self.operations.push(Operation::Delete {
            cf: cf.to_string(),
            key,
        });
        Ok(())
    }

    fn get_raw(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        read_bucket(&self.buckets, cf, key)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryBatch {
            buckets,
            operations,
            _writer,
        } = *self;
        let count = operations.len();

        // Applied under one write guard so readers never see half a batch.
        let mut buckets = buckets.write();
        for operation in operations {
            match operation {
                Operation::Put { cf, key, value } => {
                    if let Some(bucket) = buckets.get_mut(&cf) {
                        bucket.insert(key, value);
                    }
                }
                Operation::Delete { cf, key } => {
                    if let Some(bucket) = buckets.get_mut(&cf) {
                        bucket.remove(&key);
                    }
                }
            }
        }

        debug!(operations = count, "Batch committed successfully");
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        debug!("Batch rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{column_families::*, traits::BatchExt};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = MemoryStorage::new();
        let key = Uuid::new_v4();

        storage.put(CF_TOKEN, &key, &"owner".to_string()).await.unwrap();
        let value: Option<String> = storage.get(CF_TOKEN, &key).await.unwrap();
        assert_eq!(value.as_deref(), Some("owner"));

        storage.delete(CF_TOKEN, &key).await.unwrap();
        assert!(!storage.exists(CF_TOKEN, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_is_invisible_until_commit() {
        let storage = MemoryStorage::new();
        let key = Uuid::new_v4();

        let mut batch = storage.begin_transaction().await.unwrap();
        batch.put(CF_IDENTITY, &key, &7u32).unwrap();
        assert!(!storage.exists(CF_IDENTITY, &key).await.unwrap());

        batch.commit().await.unwrap();
        assert!(storage.exists(CF_IDENTITY, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let storage = MemoryStorage::new();
        let key = Uuid::new_v4();

        let mut batch = storage.begin_transaction().await.unwrap();
        batch.put(CF_IDENTITY, &key, &7u32).unwrap();
        batch.rollback();

        assert!(!storage.exists(CF_IDENTITY, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_bucket_rejected_in_batch() {
        let storage = MemoryStorage::new();

        let mut batch = storage.begin_transaction().await.unwrap();
        let result = batch.put("nope", &1u8, &1u8);
        assert!(matches!(result, Err(StorageError::InvalidColumnFamily(_))));
    }

    #[tokio::test]
    async fn test_scan_until_ignores_later_writes() {
        let storage = MemoryStorage::new();

        storage.put(CF_TOKEN_TTL, &1u64.to_be_bytes(), &1u8).await.unwrap();
        storage.put(CF_TOKEN_TTL, &5u64.to_be_bytes(), &5u8).await.unwrap();

        let results: Vec<(Vec<u8>, u8)> = storage
            .scan_until(CF_TOKEN_TTL, &3u64.to_be_bytes())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, 1);
    }
}
