use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::Database;

impl Database {
    pub async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.query_row(
                "SELECT value FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .with_context(|| format!("failed to read blob '{key}'"))
        })
        .await
    }

    /// Replace the blob under `key` in a single upsert statement.
    pub async fn write_blob(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write blob '{key}'"))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &tempfile::TempDir) -> Database {
        Database::new(dir.path().join("nested").join("scans.sqlite3")).unwrap()
    }

    #[tokio::test]
    async fn missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        assert_eq!(db.read_blob("scannedDocuments").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);

        db.write_blob("k", vec![1, 2, 3]).await.unwrap();
        db.write_blob("k", vec![9]).await.unwrap();

        assert_eq!(db.read_blob("k").await.unwrap(), Some(vec![9]));
    }

    #[tokio::test]
    async fn blobs_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = open(&dir);
            db.write_blob("k", b"persisted".to_vec()).await.unwrap();
        }

        let db = open(&dir);
        assert_eq!(db.read_blob("k").await.unwrap(), Some(b"persisted".to_vec()));
        assert!(db.path().ends_with("scans.sqlite3"));
    }
}
