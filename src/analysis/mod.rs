//! Feature extraction and scoring.
//!
//! Each extractor is a free function from one window (or the transcript) to
//! a metrics record carrying its own 0-100 score. Extractors never error: a
//! degenerate window yields an all-zero record so one bad category can never
//! block the others or the snapshot.

pub mod clarity;
pub mod fluency;
pub mod prosody;
mod score;
#[cfg(test)]
mod tests;
pub mod volume;

pub use score::aggregate;

use crate::audio::AudioWindow;
use crate::config::AnalyzerConfig;
use crate::snapshot::Scores;
use serde::{Deserialize, Serialize};

/// Pitch statistics over the voiced portion of a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneMetrics {
    pub pitch_mean: f64,
    pub pitch_std: f64,
    pub pitch_range: f64,
    pub score: u8,
}

/// Spectral shape statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarityMetrics {
    pub spectral_centroid_mean: f64,
    pub spectral_rolloff_mean: f64,
    pub zero_crossing_rate_mean: f64,
    pub mfcc_variance: f64,
    pub score: u8,
}

/// Short-window RMS consistency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetrics {
    pub rms_mean: f64,
    pub rms_std: f64,
    pub consistency: f64,
    pub score: u8,
}

/// Filler-word usage derived from the transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillerMetrics {
    pub count: usize,
    pub ratio: f64,
    /// Distinct filler tokens observed, sorted.
    pub types: Vec<String>,
    pub score: u8,
}

/// Speaking rate derived from the transcript and window duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateMetrics {
    pub words_per_minute: f64,
    pub word_count: usize,
    pub score: u8,
}

/// All raw metrics for one window. The transcript-derived categories are
/// `None` when no transcript was available; no alert is generated for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub tone: ToneMetrics,
    pub clarity: ClarityMetrics,
    pub volume: VolumeMetrics,
    pub fillers: Option<FillerMetrics>,
    pub rate: Option<RateMetrics>,
}

/// Run every extractor over one window plus its transcript, then aggregate.
/// Fluency runs only when a transcript exists; the other extractors are
/// independent of it.
pub fn analyze_window(
    window: &AudioWindow,
    transcription: &str,
    cfg: &AnalyzerConfig,
) -> (WindowMetrics, Scores, Vec<String>) {
    let mut metrics = WindowMetrics {
        tone: prosody::analyze(window, cfg),
        clarity: clarity::analyze(window, cfg),
        volume: volume::analyze(window),
        fillers: None,
        rate: None,
    };
    if !transcription.trim().is_empty() {
        metrics.fillers = Some(fluency::analyze_fillers(transcription, cfg));
        metrics.rate = Some(fluency::analyze_rate(
            transcription,
            window.duration_secs(),
            cfg,
        ));
    }
    let (scores, alerts) = aggregate(&metrics, cfg);
    (metrics, scores, alerts)
}
