//! Analyzer configuration: thresholds, weights, and capture geometry.
//!
//! The config is a plain value. Pipeline passes read a snapshot by value, so
//! concurrent updates take effect on the next window and never tear an
//! in-flight extraction.

#[cfg(test)]
mod tests;
mod validation;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_WINDOW_SECS: f64 = 3.0;
pub const DEFAULT_OVERLAP_SECS: f64 = 0.5;
pub const DEFAULT_SPEECH_RMS_THRESHOLD: f64 = 0.01;
pub const DEFAULT_FILLER_RATIO_THRESHOLD: f64 = 0.05;
/// Spectral centroid divisor for the clarity score. Empirical calibration
/// point, not a physical constant.
pub const DEFAULT_CENTROID_NORM_HZ: f64 = 2000.0;
/// MFCC variance divisor for the clarity score. Empirical calibration point.
pub const DEFAULT_MFCC_VARIANCE_NORM: f64 = 100.0;
/// Divisor applied to excess WPM when scoring overly fast speech.
pub const DEFAULT_RATE_PENALTY_DIVISOR: f64 = 2.0;
pub const DEFAULT_TRANSCRIBE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 100;
/// Tolerance when checking that the four category weights sum to 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Inclusive "good" band for a measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoodRange {
    pub low: f64,
    pub high: f64,
}

impl GoodRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn is_ordered(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low >= 0.0 && self.low < self.high
    }
}

/// Relative weight of each category in the overall score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub tone: f64,
    pub clarity: f64,
    pub volume: f64,
    pub fluency: f64,
}

impl CategoryWeights {
    pub fn sum(&self) -> f64 {
        self.tone + self.clarity + self.volume + self.fluency
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
            && self.tone >= 0.0
            && self.clarity >= 0.0
            && self.volume >= 0.0
            && self.fluency >= 0.0
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            tone: 0.25,
            clarity: 0.25,
            volume: 0.20,
            fluency: 0.30,
        }
    }
}

/// Filler tokens matched against lower-cased word tokens.
pub fn default_filler_words() -> Vec<String> {
    [
        "um", "uh", "er", "ah", "like", "so", "well", "actually", "basically", "literally",
        "seriously", "totally",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

/// All tunable options for the analysis pipeline. Serializes to flat JSON so
/// the settings collaborator can persist and reload it without precision loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub sample_rate: u32,
    /// Duration of one analysis window.
    pub window_secs: f64,
    /// Trailing portion of each window re-analyzed in the next one.
    pub overlap_secs: f64,
    /// Pitch standard deviation band (Hz) considered natural prosody.
    pub pitch_std_good: GoodRange,
    /// Speaking rate band (words per minute) considered comfortable.
    pub wpm_good: GoodRange,
    /// RMS consistency ratio above which volume is considered steady.
    pub volume_consistency_good: f64,
    /// Filler ratio above which the filler score starts dropping.
    pub filler_ratio_threshold: f64,
    pub filler_words: Vec<String>,
    pub weights: CategoryWeights,
    /// Windows whose normalized RMS falls below this are treated as silence.
    pub speech_rms_threshold: f64,
    pub centroid_norm_hz: f64,
    pub mfcc_variance_norm: f64,
    pub rate_penalty_divisor: f64,
    pub transcribe_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    /// Minimum interval between published snapshots.
    pub publish_interval_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            window_secs: DEFAULT_WINDOW_SECS,
            overlap_secs: DEFAULT_OVERLAP_SECS,
            pitch_std_good: GoodRange::new(50.0, 150.0),
            wpm_good: GoodRange::new(150.0, 200.0),
            volume_consistency_good: 0.8,
            filler_ratio_threshold: DEFAULT_FILLER_RATIO_THRESHOLD,
            filler_words: default_filler_words(),
            weights: CategoryWeights::default(),
            speech_rms_threshold: DEFAULT_SPEECH_RMS_THRESHOLD,
            centroid_norm_hz: DEFAULT_CENTROID_NORM_HZ,
            mfcc_variance_norm: DEFAULT_MFCC_VARIANCE_NORM,
            rate_penalty_divisor: DEFAULT_RATE_PENALTY_DIVISOR,
            transcribe_timeout_ms: DEFAULT_TRANSCRIBE_TIMEOUT_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            publish_interval_ms: DEFAULT_PUBLISH_INTERVAL_MS,
        }
    }
}

impl AnalyzerConfig {
    /// Window length in samples.
    pub fn window_samples(&self) -> usize {
        (self.window_secs * f64::from(self.sample_rate)).round() as usize
    }

    /// Overlap length in samples.
    pub fn overlap_samples(&self) -> usize {
        (self.overlap_secs * f64::from(self.sample_rate)).round() as usize
    }

    /// Samples drained per slice. Always at least one so slicing makes
    /// progress even under a degenerate (unsanitized) config.
    pub fn step_samples(&self) -> usize {
        self.window_samples()
            .saturating_sub(self.overlap_samples())
            .max(1)
    }
}
