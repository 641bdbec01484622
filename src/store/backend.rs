use std::{collections::HashMap, sync::Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::db::Database;

/// Key-value storage for whole serialized blobs.
///
/// `write` must replace the previous value in one step: a reader never sees a
/// partially written blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

#[async_trait]
impl BlobStore for Database {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.read_blob(key).await
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.write_blob(key, value).await
    }
}

/// Process-local blobs, for tests and hosts without a writable filesystem.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing serialization.
    pub fn insert_raw(&self, key: &str, value: Vec<u8>) {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(blobs.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.insert_raw(key, value);
        Ok(())
    }
}
