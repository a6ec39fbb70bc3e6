//! # identify-storage
//!
//! Storage abstraction layer for identify.
//!
//! Two engines implement [`Storage`]:
//!
//! - [`RocksDbStorage`], the production engine, one column family per bucket
//! - [`MemoryStorage`], an in-memory engine for tests
//!
//! Both serialize writers: a transaction holds the write lock from
//! [`Storage::begin_transaction`] until it is committed or dropped. Reads never take it.

#![warn(clippy::all)]

pub mod column_families;
pub mod errors;
pub mod memory;
pub mod rocksdb_impl;
pub mod traits;

pub use column_families::*;
pub use errors::{Result, StorageError};
pub use memory::MemoryStorage;
pub use rocksdb_impl::RocksDbStorage;
pub use traits::{Batch, BatchExt, Storage};
