//! RocksDB storage implementation.

use crate::{
    column_families::all_column_families,
    errors::{Result, StorageError},
    traits::{deserialize_value, serialize_key, serialize_value, within_bound, Batch, Storage},
};
use async_trait::async_trait;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use std::{path::Path, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// RocksDB storage implementation
///
/// RocksDB itself allows concurrent writers; the `writer` mutex narrows that to one open
/// transaction at a time so read-check-write sequences inside a transaction are atomic.
pub struct RocksDbStorage {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDbStorage {
    /// Open RocksDB database at the specified path
    ///
    /// Creates all required column families if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = DB::open_cf(&opts, &path, all_column_families())
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!("Opened RocksDB at {:?}", path.as_ref());

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Open a database in a fresh temporary directory.
    ///
    /// The directory is removed when the returned guard drops, so keep it alive for as long
    /// as the storage is used.
    pub fn open_temporary() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::TempDir::new()?;
        let storage = Self::open(temp_dir.path().join("db"))?;
        Ok((storage, temp_dir))
    }

    /// Get column family handle
    fn cf_handle(&self, cf: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
    }
}

#[async_trait]
impl Storage for RocksDbStorage {
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let cf_handle = self.cf_handle(cf)?;
        let key_bytes = serialize_key(key)?;

        let result = self
            .db
            .get_cf(cf_handle, &key_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        match result {
            Some(bytes) => {
                let value = deserialize_value(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;

        let _guard = self.writer.lock().await;
        let cf_handle = self.cf_handle(cf)?;
        self.db
            .put_cf(cf_handle, &key_bytes, &value_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;

        let _guard = self.writer.lock().await;
        let cf_handle = self.cf_handle(cf)?;
        self.db
            .delete_cf(cf_handle, &key_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync,
    {
        let cf_handle = self.cf_handle(cf)?;
        let key_bytes = serialize_key(key)?;

        let result = self
            .db
            .get_pinned_cf(cf_handle, &key_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(result.is_some())
    }

    async fn scan_until<V>(&self, cf: &str, bound: &[u8]) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned,
    {
        let cf_handle = self.cf_handle(cf)?;
        let snapshot = self.db.snapshot();

        let mut results = Vec::new();
        for item in snapshot.iterator_cf(cf_handle, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| StorageError::Database(e.to_string()))?;

            // Keys are sorted, so once we're past the bound, we're done
            if !within_bound(&key, bound) {
                break;
            }

            let deserialized_value = deserialize_value(&value)?;
            results.push((key.to_vec(), deserialized_value));
        }

        Ok(results)
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Batch>> {
        let guard = Arc::clone(&self.writer).lock_owned().await;

        Ok(Box::new(RocksDbBatch {
            db: Arc::clone(&self.db),
            write_batch: WriteBatch::default(),
            _writer: guard,
        }))
    }

    async fn flush(&self) -> Result<()> {
        for cf in all_column_families() {
            let cf_handle = self.cf_handle(cf)?;
            self.db
                .flush_cf(cf_handle)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        debug!("Flushed all column families");
        Ok(())
    }
}

/// RocksDB batch implementation
pub struct RocksDbBatch {
    db: Arc<DB>,
    write_batch: WriteBatch,
    _writer: OwnedMutexGuard<()>,
}

impl RocksDbBatch {
    fn cf_handle(&self, cf: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
    }
}

#[async_trait]
impl Batch for RocksDbBatch {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let cf_handle = self
            .db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;

        self.write_batch.put_cf(cf_handle, &key, &value);

        Ok(())
    }

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()> {
        let cf_handle = self
            .db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;

        self.write_batch.delete_cf(cf_handle, &key);

        Ok(())
    }

    fn get_raw(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf_handle = self.cf_handle(cf)?;

        self.db
            .get_cf(cf_handle, key)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let RocksDbBatch {
            db,
            write_batch,
            _writer,
        } = *self;
        let operations = write_batch.len();

        db.write(write_batch)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!(operations, "Batch committed successfully");
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        // WriteBatch is dropped, no commit
        debug!("Batch rolled back");
    }
}
