use crate::ocr::OcrError;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("a capture is already being processed")]
    CaptureInFlight,

    #[error("cannot handle '{event}' while {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("failed to compress captured image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("recognition worker failed: {0}")]
    Worker(String),
}
