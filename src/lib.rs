//! QuickScan core: capture → recognize → score → persist → notify.
//!
//! Hosts own the camera and the OCR engine. They hand captured images to a
//! [`ScannerController`], implement [`TextRecognizer`] over their platform
//! engine, and observe [`ScannerEvent`]s to drive their UI.

pub mod confidence;
pub mod db;
pub mod models;
pub mod ocr;
pub mod scanner;
pub mod settings;
pub mod store;
pub mod utils;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};

pub use db::Database;
pub use models::{RecordList, ScanRecord, ShareBundle};
pub use ocr::{OcrError, TextRecognizer};
pub use scanner::{PipelineState, ScanError, ScannerController, ScannerEvent, StatePublisher};
pub use settings::{CaptureSettings, SettingsStore};
pub use store::{BlobStore, MemoryBlobStore, RecordStore, StoreError};

pub const DATABASE_FILE: &str = "quickscan.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";

/// Everything a host needs, wired over one data directory.
pub struct ScannerApp {
    pub db: Database,
    pub settings: SettingsStore,
    pub scanner: ScannerController,
}

impl ScannerApp {
    /// Persist new capture settings and apply them to later captures.
    pub fn update_capture_settings(&self, settings: CaptureSettings) -> Result<()> {
        self.settings.update_capture(settings.clone())?;
        self.scanner.set_capture_settings(settings);
        Ok(())
    }
}

/// Open (or create) the database and settings under `data_dir` and load the
/// saved records into a fresh, idle scanner.
pub async fn open(data_dir: &Path, recognizer: Arc<dyn TextRecognizer>) -> Result<ScannerApp> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let db = Database::new(data_dir.join(DATABASE_FILE))?;
    let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;

    let store = RecordStore::new(Arc::new(db.clone()));
    let scanner = ScannerController::new(store, recognizer, settings.capture()).await;

    log::info!(
        "QuickScan core opened with {} saved records ({})",
        scanner.records().len(),
        db.path().display()
    );

    Ok(ScannerApp {
        db,
        settings,
        scanner,
    })
}
