//! Durable storage for the ordered scan record list.
//!
//! The whole list is serialized to one JSON blob under [`RECORDS_KEY`] and
//! rewritten on every change. List edits are pure functions over slices; the
//! caller decides when to persist.

mod backend;

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{RecordList, ScanRecord};

pub use backend::{BlobStore, MemoryBlobStore};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Fixed key holding the serialized record list.
pub const RECORDS_KEY: &str = "scannedDocuments";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to serialize scan records: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    #[error("persisted scan records are corrupt: {0}")]
    LoadCorrupt(#[source] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn BlobStore>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn BlobStore>) -> Self {
        Self { backend }
    }

    /// Load the persisted list. A missing key is an empty list; unreadable or
    /// corrupt data is logged and also yields an empty list.
    pub async fn load(&self) -> RecordList {
        match self.try_load().await {
            Ok(records) => records,
            Err(err) => {
                log_warn!("Discarding unreadable scan records, starting empty: {err}");
                RecordList::new()
            }
        }
    }

    pub async fn try_load(&self) -> Result<RecordList, StoreError> {
        let Some(bytes) = self.backend.read(RECORDS_KEY).await? else {
            return Ok(RecordList::new());
        };
        serde_json::from_slice(&bytes).map_err(StoreError::LoadCorrupt)
    }

    /// Serialize `records` and overwrite the persisted blob.
    pub async fn save(&self, records: &[ScanRecord]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(records).map_err(StoreError::SerializationFailed)?;
        let size = bytes.len();
        self.backend.write(RECORDS_KEY, bytes).await?;
        log_info!("Saved {} scan records ({} bytes)", records.len(), size);
        Ok(())
    }
}

/// New list with `record` at the front. `records` is left untouched.
pub fn insert_front(records: &[ScanRecord], record: ScanRecord) -> RecordList {
    let mut updated = RecordList::with_capacity(records.len() + 1);
    updated.push(record);
    updated.extend_from_slice(records);
    updated
}

/// New list without any record whose id is `id`. Absent ids are a no-op.
pub fn remove(records: &[ScanRecord], id: Uuid) -> RecordList {
    records
        .iter()
        .filter(|record| record.id() != id)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn record(text: &str, image: &[u8], confidence: f64) -> ScanRecord {
        ScanRecord::new(
            text.to_string(),
            image.to_vec(),
            confidence,
            Duration::from_nanos(123_456_789),
        )
    }

    fn memory_store() -> (Arc<MemoryBlobStore>, RecordStore) {
        let backend = Arc::new(MemoryBlobStore::new());
        let store = RecordStore::new(backend.clone());
        (backend, store)
    }

    #[tokio::test]
    async fn missing_blob_loads_empty() {
        let (_, store) = memory_store();
        assert!(store.load().await.is_empty());
        assert!(store.try_load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_exactly() {
        let (_, store) = memory_store();
        let records = vec![
            record("second scan", &[0, 1, 2, 255], 0.1 + 0.2),
            record("first scan\nwith lines", &[], 1.0 / 3.0),
            record("ünïcödé", &[42; 64], 0.3),
        ];

        store.save(&records).await.unwrap();
        let loaded = store.load().await;

        assert_eq!(loaded, records);
        for (a, b) in loaded.iter().zip(&records) {
            assert_eq!(a.confidence().to_bits(), b.confidence().to_bits());
            assert_eq!(a.captured_at(), b.captured_at());
        }
    }

    #[tokio::test]
    async fn save_overwrites_previous_list() {
        let (_, store) = memory_store();
        store.save(&[record("old", &[1], 0.5)]).await.unwrap();
        store.save(&[]).await.unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_blob_loads_empty_but_reports_through_try_load() {
        let (backend, store) = memory_store();
        backend.insert_raw(RECORDS_KEY, b"{not json".to_vec());

        assert!(store.load().await.is_empty());
        assert!(matches!(
            store.try_load().await,
            Err(StoreError::LoadCorrupt(_))
        ));
    }

    #[tokio::test]
    async fn invalid_base64_image_is_corrupt() {
        let (backend, store) = memory_store();
        let json = r#"[{"id":"6f1c1a3e-2f7b-4a43-9a53-0a8e2d5c9b10","text":"x","imageBytes":"***","confidence":0.5,"capturedAt":"2026-10-16T09:41:00Z","processingDurationSeconds":0.1}]"#;
        backend.insert_raw(RECORDS_KEY, json.as_bytes().to_vec());

        assert!(matches!(
            store.try_load().await,
            Err(StoreError::LoadCorrupt(_))
        ));
    }

    #[test]
    fn insert_front_prepends_without_touching_input() {
        let original = vec![record("a", &[], 0.5)];
        let newest = record("b", &[], 0.5);

        let updated = insert_front(&original, newest.clone());

        assert_eq!(original.len(), 1);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0], newest);
        assert_eq!(updated[1], original[0]);
    }

    #[test]
    fn remove_undoes_insert_front() {
        let original = vec![record("a", &[], 0.5), record("b", &[], 0.5)];
        let added = record("c", &[], 0.5);

        let updated = insert_front(&original, added.clone());
        assert_eq!(remove(&updated, added.id()), original);
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let original = vec![record("a", &[], 0.5)];
        assert_eq!(remove(&original, Uuid::new_v4()), original);
        assert!(remove(&[], Uuid::new_v4()).is_empty());
    }
}
