//! Storage trait definitions.

use crate::errors::{Result, StorageError};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Storage interface for key-value operations
///
/// Implementations provide named buckets, point reads, snapshot range scans and
/// single-writer transactions. Reads see committed state only.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get a value by key from a column family
    ///
    /// # Returns
    ///
    /// `Ok(Some(value))` if key exists, `Ok(None)` if not found
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned;

    /// Put a key-value pair into a column family
    ///
    /// Waits for the write lock, like a one-operation transaction.
    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync;

    /// Delete a key from a column family
    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync;

    /// Check if a key exists in a column family
    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync;

    /// Scan a column family from its first key, in key order, over a consistent snapshot.
    ///
    /// Stops at the first key whose leading `bound.len()` bytes sort after `bound`. Writes
    /// committed after the scan starts are not observed. Does not take the write lock.
    async fn scan_until<V>(&self, cf: &str, bound: &[u8]) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned;

    /// Begin a write transaction.
    ///
    /// Waits until no other transaction is open. The returned batch holds the write lock
    /// until it is committed or rolled back (or dropped).
    async fn begin_transaction(&self) -> Result<Box<dyn Batch>>;

    /// Flush buffered writes of every column family to disk
    async fn flush(&self) -> Result<()>;
}

/// Batch interface for atomic operations
///
/// Note: This trait works with pre-serialized bytes to maintain object safety.
/// Use [`BatchExt`] for typed keys and values.
///
/// Batches only need to be `Send` (not `Sync`) since they are used within a single
/// task context and not shared across threads.
#[async_trait]
pub trait Batch: Send {
    /// Put a pre-serialized key-value pair in the batch
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Delete a pre-serialized key in the batch
    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()>;

    /// Read a committed value.
    ///
    /// Writes staged in this batch are not visible. Since the batch holds the write lock,
    /// the value cannot change before commit except through this batch.
    fn get_raw(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Commit the batch atomically and release the write lock
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the batch (drop without committing)
    fn rollback(self: Box<Self>);
}

/// Extension trait providing type-safe methods for Batch
pub trait BatchExt: Batch {
    /// Put a key-value pair in the batch (type-safe)
    fn put<K, V>(&mut self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;
        self.put_raw(cf, key_bytes, value_bytes)
    }

    /// Delete a key in the batch (type-safe)
    fn delete<K>(&mut self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize,
    {
        let key_bytes = serialize_key(key)?;
        self.delete_raw(cf, key_bytes)
    }

    /// Read a committed value (type-safe)
    fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize,
        V: DeserializeOwned,
    {
        let key_bytes = serialize_key(key)?;
        self.get_raw(cf, &key_bytes)?
            .map(|bytes| deserialize_value(&bytes))
            .transpose()
    }
}

/// Automatically implement BatchExt for all types that implement Batch
impl<T: Batch + ?Sized> BatchExt for T {}

/// Helper function to serialize a key
pub fn serialize_key<K: Serialize + ?Sized>(key: &K) -> Result<Vec<u8>> {
    bincode::serialize(key).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Helper function to serialize a value
pub(crate) fn serialize_value<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Helper function to deserialize a value
pub(crate) fn deserialize_value<V: DeserializeOwned>(bytes: &[u8]) -> Result<V> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Deserialization(e.to_string()))
}

/// True while `key` has not sorted past `bound` in its leading bytes.
pub(crate) fn within_bound(key: &[u8], bound: &[u8]) -> bool {
    let len = key.len().min(bound.len());
    &key[..len] <= bound
}
