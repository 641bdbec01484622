use std::time::Duration;

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One successful scan: recognized text, the compressed capture and metadata.
///
/// Records are immutable once built. The only way a record leaves the list is
/// an explicit delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    id: Uuid,
    text: String,
    #[serde(with = "base64_bytes")]
    image_bytes: Vec<u8>,
    confidence: f64,
    captured_at: DateTime<Utc>,
    processing_duration_seconds: f64,
}

impl ScanRecord {
    pub fn new(
        text: String,
        image_bytes: Vec<u8>,
        confidence: f64,
        processing_duration: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            image_bytes,
            confidence,
            captured_at: Utc::now(),
            processing_duration_seconds: processing_duration.as_secs_f64(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image_bytes(&self) -> &[u8] {
        &self.image_bytes
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn processing_duration_seconds(&self) -> f64 {
        self.processing_duration_seconds
    }

    /// Confidence as a percentage with one decimal, e.g. `"87.5%"`.
    pub fn confidence_percentage(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }

    /// Medium date with short time, e.g. `"Oct 16, 2026 at 9:41 AM"` (UTC).
    pub fn formatted_date(&self) -> String {
        self.captured_at
            .format("%b %-d, %Y at %-I:%M %p")
            .to_string()
    }

    pub fn decode_image(&self) -> ImageResult<DynamicImage> {
        image::load_from_memory(&self.image_bytes)
    }

    pub fn share_bundle(&self) -> ShareBundle {
        ShareBundle {
            text: self.text.clone(),
            image_bytes: self.image_bytes.clone(),
        }
    }
}

/// Payload handed to the host share sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareBundle {
    pub text: String,
    pub image_bytes: Vec<u8>,
}

/// Image bytes travel inline in the persisted blob as standard base64.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
