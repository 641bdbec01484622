//! Confidence heuristic for recognized text.
//!
//! The score is a proxy for recognition quality, not a calibrated probability:
//! longer average tokens score higher, and any non-empty text scores at least
//! [`MIN_CONFIDENCE`]. Do not present it to users as more than that.

use unicode_segmentation::UnicodeSegmentation;

/// Floor applied to every non-empty text.
pub const MIN_CONFIDENCE: f64 = 0.3;

/// Average token length that maps to full confidence.
const FULL_CONFIDENCE_WORD_LENGTH: f64 = 5.0;

/// Score `text` in `[MIN_CONFIDENCE, 1.0]`, or exactly `0.0` for empty text.
///
/// Characters are user-perceived characters (extended grapheme clusters), so
/// `"\r\n"` and a letter with a combining accent each count once. Every
/// whitespace character is a token boundary, so runs of separators produce
/// empty tokens and pull the average down.
pub fn estimate(text: &str) -> f64 {
    let character_count = text.graphemes(true).count();
    if character_count == 0 {
        return 0.0;
    }

    let word_count = text.split(char::is_whitespace).count().max(1);
    let average_word_length = character_count as f64 / word_count as f64;
    let raw = (average_word_length / FULL_CONFIDENCE_WORD_LENGTH).min(1.0);

    raw.max(MIN_CONFIDENCE)
}
