//! Error taxonomy for the analysis pipeline.
//!
//! Recoverable conditions (engine missing, transcription timeout) are
//! distinct variants so callers can degrade instead of aborting a session.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoachError {
    /// The external transcription engine binary or model could not be
    /// resolved. The pipeline keeps running with empty transcripts.
    #[error("transcription engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The external transcription process exceeded its wall-clock budget and
    /// was killed.
    #[error("transcription exceeded its {budget:?} budget")]
    TimeoutExceeded { budget: Duration },

    /// No usable audio input source could be selected. Fatal to starting a
    /// session.
    #[error("no usable audio input source found")]
    NoSourceFound,

    /// Configuration failed validation. Loaders substitute defaults and warn
    /// instead of surfacing this mid-pipeline.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Audio capture setup or streaming failed.
    #[error("audio capture failed: {0}")]
    Capture(String),

    #[error("wav encoding failed: {0}")]
    Encode(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
