use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Instant,
};

use image::{codecs::jpeg::JpegEncoder, DynamicImage};
use tokio::{sync::Mutex, task::JoinHandle};
use uuid::Uuid;

use crate::{
    confidence,
    models::{RecordList, ScanRecord, ShareBundle},
    ocr::{self, TextRecognizer},
    settings::CaptureSettings,
    store::{self, RecordStore},
};

use super::{PipelineEvent, PipelineState, ScanError, ScannerEvent, StatePublisher};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Drives captures through recognition into the record list.
///
/// Cheap to clone; clones share the same publisher, store and in-flight guard.
#[derive(Clone)]
pub struct ScannerController {
    publisher: StatePublisher,
    store: Arc<Mutex<RecordStore>>,
    recognizer: Arc<dyn TextRecognizer>,
    capture: Arc<RwLock<CaptureSettings>>,
    in_flight: Arc<AtomicBool>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ScannerController {
    /// Load the persisted records and start in `Idle`.
    pub async fn new(
        store: RecordStore,
        recognizer: Arc<dyn TextRecognizer>,
        capture: CaptureSettings,
    ) -> Self {
        let records = store.load().await;
        log_info!("Scanner ready with {} saved records", records.len());

        Self {
            publisher: StatePublisher::new(records),
            store: Arc::new(Mutex::new(store)),
            recognizer,
            capture: Arc::new(RwLock::new(capture)),
            in_flight: Arc::new(AtomicBool::new(false)),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::mpsc::UnboundedReceiver<ScannerEvent> {
        self.publisher.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.publisher.state()
    }

    pub fn records(&self) -> Arc<RecordList> {
        self.publisher.records()
    }

    pub fn record(&self, id: Uuid) -> Option<ScanRecord> {
        self.publisher
            .records()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    pub fn share_bundle(&self, id: Uuid) -> Option<ShareBundle> {
        self.record(id).map(|record| record.share_bundle())
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        self.capture
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Applies to captures accepted after this call.
    pub fn set_capture_settings(&self, settings: CaptureSettings) {
        *self
            .capture
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }

    pub fn start_scanning(&self) -> Result<(), ScanError> {
        self.publisher.apply(PipelineEvent::StartScanning)?;
        Ok(())
    }

    pub fn stop_scanning(&self) -> Result<(), ScanError> {
        self.publisher.apply(PipelineEvent::StopScanning)?;
        Ok(())
    }

    /// Accept a captured image and start recognition in the background.
    ///
    /// Returns once the capture is accepted; the outcome arrives as a
    /// `Completed` or `Failed` state. An undecodable image fails immediately
    /// without reaching OCR. A second capture while one is in flight is
    /// rejected with [`ScanError::CaptureInFlight`].
    pub async fn process_captured_image(&self, image_bytes: Vec<u8>) -> Result<(), ScanError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log_warn!("Ignoring capture: another capture is still processing");
            return Err(ScanError::CaptureInFlight);
        }

        let decoded = tokio::task::spawn_blocking(move || ocr::decode_capture(&image_bytes)).await;
        let image = match decoded {
            Ok(Ok(image)) => image,
            Ok(Err(err)) => {
                log_warn!("Rejecting capture: {err}");
                let result = self
                    .publisher
                    .apply(PipelineEvent::CaptureRejected(err.to_string()));
                self.release();
                return result.map(|_| ());
            }
            Err(join_err) => {
                self.release();
                return Err(ScanError::Worker(join_err.to_string()));
            }
        };

        if let Err(err) = self.publisher.apply(PipelineEvent::ImageCaptured) {
            self.release();
            return Err(err);
        }

        log_info!(
            "Processing capture {}x{}",
            image.width(),
            image.height()
        );

        let quality = self.capture_settings().jpeg_quality;
        // Hold the slot while spawning so a finished capture can never
        // overwrite the handle of the one after it.
        let mut worker = self.worker.lock().await;
        let controller = self.clone();
        *worker = Some(tokio::spawn(async move {
            controller.run_capture(image, quality).await;
        }));

        Ok(())
    }

    /// Wait for the in-flight capture, if any, to reach its terminal state.
    pub async fn wait_for_capture(&self) {
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                log_error!("Capture task ended abnormally: {err}");
            }
        }
    }

    /// Remove a record and persist the shorter list. Persistence failures are
    /// logged and published, never returned.
    pub async fn delete_record(&self, id: Uuid) {
        let store = self.store.lock().await;
        let current = self.publisher.records();
        let updated = store::remove(&current, id);
        if updated.len() == current.len() {
            log_info!("Delete ignored: no record with id {id}");
            return;
        }

        self.persist(&store, &updated).await;
        self.publisher.set_records(updated);
        log_info!("Deleted record {id}");
    }

    async fn run_capture(self, image: DynamicImage, quality: u8) {
        let recognizer = self.recognizer.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            build_record(recognizer.as_ref(), image, quality)
        })
        .await
        .unwrap_or_else(|join_err| Err(ScanError::Worker(join_err.to_string())));

        match outcome {
            Ok(record) => self.commit_record(record).await,
            Err(err) => {
                log_warn!("Capture failed: {err}");
                self.finish(PipelineEvent::RecognitionFailed(err.to_string()));
            }
        }

        self.release();
    }

    async fn commit_record(&self, record: ScanRecord) {
        log_info!(
            "Recognized {} chars in {:.3}s (confidence {})",
            record.text().chars().count(),
            record.processing_duration_seconds(),
            record.confidence_percentage()
        );

        let store = self.store.lock().await;
        let updated = store::insert_front(&self.publisher.records(), record.clone());
        self.persist(&store, &updated).await;
        self.publisher.set_records(updated);
        self.finish(PipelineEvent::RecognitionSucceeded(record));
    }

    async fn persist(&self, store: &RecordStore, records: &[ScanRecord]) {
        if let Err(err) = store.save(records).await {
            log_error!("Failed to persist {} scan records: {err}", records.len());
            self.publisher.report_persist_failure(err.to_string());
        }
    }

    fn finish(&self, event: PipelineEvent) {
        if let Err(err) = self.publisher.apply(event) {
            log_error!("Dropped capture outcome: {err}");
        }
    }

    fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Recognize, score and compress one capture. Runs on the blocking pool.
fn build_record(
    recognizer: &dyn TextRecognizer,
    image: DynamicImage,
    jpeg_quality: u8,
) -> Result<ScanRecord, ScanError> {
    let started = Instant::now();
    let text = ocr::recognize_text(recognizer, &image)?;
    let elapsed = started.elapsed();

    let confidence = confidence::estimate(&text);
    let image_bytes = encode_jpeg(&image, jpeg_quality)?;

    Ok(ScanRecord::new(text, image_bytes, confidence, elapsed))
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
    Ok(bytes)
}
