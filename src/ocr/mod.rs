//! OCR collaborator seam.
//!
//! The recognition engine belongs to the host platform (Vision on iOS, ML Kit
//! on Android, ...). Hosts implement [`TextRecognizer`] over it; the scan
//! pipeline only depends on this trait.

use image::DynamicImage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OcrError {
    #[error("invalid image")]
    InvalidImage,

    #[error("no text could be recognized in the image")]
    NoTextFound,

    #[error("text recognition processing failed: {0}")]
    ProcessingFailed(String),
}

/// Synchronous text recognition over a decoded bitmap.
///
/// Called on a blocking worker thread, so implementations may block for as
/// long as the engine needs.
pub trait TextRecognizer: Send + Sync + 'static {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&DynamicImage) -> Result<String, OcrError> + Send + Sync + 'static,
{
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        self(image)
    }
}

/// Decode an encoded capture (PNG, JPEG, ...) into a bitmap.
pub fn decode_capture(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    let image = image::load_from_memory(bytes).map_err(|_| OcrError::InvalidImage)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(OcrError::InvalidImage);
    }
    Ok(image)
}

/// Run `recognizer` and fold empty or whitespace-only text into `NoTextFound`.
///
/// Whitespace-only text counts as no text, so a record never holds blank text
/// scored at the confidence floor.
pub fn recognize_text(
    recognizer: &dyn TextRecognizer,
    image: &DynamicImage,
) -> Result<String, OcrError> {
    let text = recognizer.recognize(image)?;
    if text.trim().is_empty() {
        return Err(OcrError::NoTextFound);
    }
    Ok(text)
}
