use serde::{Deserialize, Serialize};

use crate::models::ScanRecord;

use super::ScanError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "camelCase")]
pub enum PipelineState {
    #[default]
    Idle,
    Capturing,
    Processing,
    Completed(ScanRecord),
    Failed(String),
}

/// Inputs that drive [`PipelineState`].
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StartScanning,
    StopScanning,
    ImageCaptured,
    /// The capture could not be handed to OCR (undecodable image).
    CaptureRejected(String),
    RecognitionSucceeded(ScanRecord),
    RecognitionFailed(String),
}

impl PipelineEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineEvent::StartScanning => "start scanning",
            PipelineEvent::StopScanning => "stop scanning",
            PipelineEvent::ImageCaptured => "image captured",
            PipelineEvent::CaptureRejected(_) => "capture rejected",
            PipelineEvent::RecognitionSucceeded(_) => "recognition succeeded",
            PipelineEvent::RecognitionFailed(_) => "recognition failed",
        }
    }
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Capturing => "capturing",
            PipelineState::Processing => "processing",
            PipelineState::Completed(_) => "completed",
            PipelineState::Failed(_) => "failed",
        }
    }

    /// Resolve the state reached by `event`.
    ///
    /// `Ok(None)` means the event is accepted but changes nothing. While
    /// processing, only the recognition outcome is accepted. A shown result
    /// does not block the next capture.
    pub fn next(&self, event: PipelineEvent) -> Result<Option<PipelineState>, ScanError> {
        use PipelineEvent as E;
        use PipelineState as S;

        let next = match (self, event) {
            (S::Processing, E::RecognitionSucceeded(record)) => S::Completed(record),
            (S::Processing, E::RecognitionFailed(message)) => S::Failed(message),
            (S::Processing, _) => return Err(ScanError::CaptureInFlight),

            (S::Capturing, E::StartScanning) | (S::Idle, E::StopScanning) => return Ok(None),
            (S::Idle | S::Completed(_) | S::Failed(_), E::StartScanning) => S::Capturing,
            (S::Capturing | S::Completed(_) | S::Failed(_), E::StopScanning) => S::Idle,

            (_, E::ImageCaptured) => S::Processing,
            (_, E::CaptureRejected(message)) => S::Failed(message),

            (from, event) => {
                return Err(ScanError::InvalidTransition {
                    from: from.as_str(),
                    event: event.as_str(),
                })
            }
        };

        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn record() -> ScanRecord {
        ScanRecord::new("Hello".into(), vec![1], 1.0, Duration::ZERO)
    }

    fn step(state: &PipelineState, event: PipelineEvent) -> PipelineState {
        state
            .next(event)
            .unwrap()
            .unwrap_or_else(|| state.clone())
    }

    #[test]
    fn happy_path_walks_to_completed() {
        let record = record();
        let mut state = PipelineState::default();
        state = step(&state, PipelineEvent::StartScanning);
        assert_eq!(state, PipelineState::Capturing);
        state = step(&state, PipelineEvent::ImageCaptured);
        assert_eq!(state, PipelineState::Processing);
        state = step(&state, PipelineEvent::RecognitionSucceeded(record.clone()));
        assert_eq!(state, PipelineState::Completed(record));
    }

    #[test]
    fn capture_from_idle_is_allowed() {
        assert_eq!(
            step(&PipelineState::Idle, PipelineEvent::ImageCaptured),
            PipelineState::Processing
        );
    }

    #[test]
    fn stop_returns_capturing_to_idle() {
        assert_eq!(
            step(&PipelineState::Capturing, PipelineEvent::StopScanning),
            PipelineState::Idle
        );
    }

    #[test]
    fn repeated_start_and_idle_stop_are_noops() {
        assert!(PipelineState::Capturing
            .next(PipelineEvent::StartScanning)
            .unwrap()
            .is_none());
        assert!(PipelineState::Idle
            .next(PipelineEvent::StopScanning)
            .unwrap()
            .is_none());
    }

    #[test]
    fn terminal_states_restart_capturing() {
        let completed = PipelineState::Completed(record());
        let failed = PipelineState::Failed("boom".into());
        assert_eq!(
            step(&completed, PipelineEvent::StartScanning),
            PipelineState::Capturing
        );
        assert_eq!(
            step(&failed, PipelineEvent::StartScanning),
            PipelineState::Capturing
        );
    }

    #[test]
    fn processing_rejects_everything_but_outcomes() {
        for event in [
            PipelineEvent::StartScanning,
            PipelineEvent::StopScanning,
            PipelineEvent::ImageCaptured,
            PipelineEvent::CaptureRejected("invalid image".into()),
        ] {
            assert!(matches!(
                PipelineState::Processing.next(event),
                Err(ScanError::CaptureInFlight)
            ));
        }
    }

    #[test]
    fn outcomes_outside_processing_are_invalid() {
        let err = PipelineState::Idle
            .next(PipelineEvent::RecognitionFailed("late".into()))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot handle 'recognition failed' while idle");
    }

    #[test]
    fn capture_from_shown_result_starts_processing() {
        let completed = PipelineState::Completed(record());
        let failed = PipelineState::Failed("x".into());
        assert_eq!(
            step(&completed, PipelineEvent::ImageCaptured),
            PipelineState::Processing
        );
        assert_eq!(
            step(&failed, PipelineEvent::ImageCaptured),
            PipelineState::Processing
        );
        assert_eq!(
            step(&completed, PipelineEvent::CaptureRejected("invalid image".into())),
            PipelineState::Failed("invalid image".into())
        );
    }

    #[test]
    fn rejected_capture_fails_without_processing() {
        assert_eq!(
            step(
                &PipelineState::Capturing,
                PipelineEvent::CaptureRejected("invalid image".into())
            ),
            PipelineState::Failed("invalid image".into())
        );
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(PipelineState::Failed("no text".into())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["payload"], "no text");

        let json = serde_json::to_value(PipelineState::Idle).unwrap();
        assert_eq!(json["status"], "idle");
    }
}
