use super::{AnalyzerConfig, CategoryWeights};
use crate::error::CoachError;
use std::path::Path;
use tracing::warn;

impl AnalyzerConfig {
    /// Strict check. Returns `InvalidConfig` naming the first violation.
    ///
    /// Loaders normally call [`AnalyzerConfig::sanitized`] instead, which
    /// substitutes defaults field by field; this is for callers that want to
    /// reject a config outright.
    pub fn validate(&self) -> Result<(), CoachError> {
        if !(8_000..=96_000).contains(&self.sample_rate) {
            return Err(CoachError::InvalidConfig(format!(
                "sample_rate must be between 8000 and 96000 Hz, got {}",
                self.sample_rate
            )));
        }
        if !self.window_secs.is_finite() || !(0.5..=30.0).contains(&self.window_secs) {
            return Err(CoachError::InvalidConfig(format!(
                "window_secs must be between 0.5 and 30.0, got {}",
                self.window_secs
            )));
        }
        if !self.overlap_secs.is_finite()
            || self.overlap_secs < 0.0
            || self.overlap_secs >= self.window_secs
        {
            return Err(CoachError::InvalidConfig(format!(
                "overlap_secs must be >= 0 and < window_secs ({}), got {}",
                self.window_secs, self.overlap_secs
            )));
        }
        if !self.weights.is_normalized() {
            return Err(CoachError::InvalidConfig(format!(
                "category weights must be non-negative and sum to 1.0, got sum {}",
                self.weights.sum()
            )));
        }
        if !self.pitch_std_good.is_ordered() {
            return Err(CoachError::InvalidConfig(format!(
                "pitch_std_good must satisfy 0 <= low < high, got {:?}",
                self.pitch_std_good
            )));
        }
        if !self.wpm_good.is_ordered() {
            return Err(CoachError::InvalidConfig(format!(
                "wpm_good must satisfy 0 <= low < high, got {:?}",
                self.wpm_good
            )));
        }
        if !self.volume_consistency_good.is_finite()
            || !(0.0..=1.0).contains(&self.volume_consistency_good)
        {
            return Err(CoachError::InvalidConfig(format!(
                "volume_consistency_good must be between 0 and 1, got {}",
                self.volume_consistency_good
            )));
        }
        if !self.filler_ratio_threshold.is_finite()
            || !(0.0..1.0).contains(&self.filler_ratio_threshold)
        {
            return Err(CoachError::InvalidConfig(format!(
                "filler_ratio_threshold must be in [0, 1), got {}",
                self.filler_ratio_threshold
            )));
        }
        if !self.speech_rms_threshold.is_finite()
            || !(0.0..1.0).contains(&self.speech_rms_threshold)
        {
            return Err(CoachError::InvalidConfig(format!(
                "speech_rms_threshold must be in [0, 1), got {}",
                self.speech_rms_threshold
            )));
        }
        if self.centroid_norm_hz <= 0.0 || self.mfcc_variance_norm <= 0.0 {
            return Err(CoachError::InvalidConfig(
                "clarity normalization constants must be positive".to_string(),
            ));
        }
        if self.rate_penalty_divisor <= 0.0 {
            return Err(CoachError::InvalidConfig(
                "rate_penalty_divisor must be positive".to_string(),
            ));
        }
        if self.transcribe_timeout_ms == 0 || self.probe_timeout_ms == 0 {
            return Err(CoachError::InvalidConfig(
                "transcription timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace every invalid field with its default, warning per substitution.
    /// Invalid settings must never silently mis-score a session.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(8_000..=96_000).contains(&self.sample_rate) {
            warn!(
                sample_rate = self.sample_rate,
                "sample_rate out of range; using default"
            );
            self.sample_rate = defaults.sample_rate;
        }
        if !self.window_secs.is_finite() || !(0.5..=30.0).contains(&self.window_secs) {
            warn!(
                window_secs = self.window_secs,
                "window_secs out of range; using default"
            );
            self.window_secs = defaults.window_secs;
        }
        if !self.overlap_secs.is_finite()
            || self.overlap_secs < 0.0
            || self.overlap_secs >= self.window_secs
        {
            warn!(
                overlap_secs = self.overlap_secs,
                window_secs = self.window_secs,
                "overlap must be shorter than the window; using default overlap"
            );
            self.overlap_secs = defaults.overlap_secs.min(self.window_secs / 2.0);
        }
        if !self.weights.is_normalized() {
            warn!(
                sum = self.weights.sum(),
                "category weights do not sum to 1.0; using default weights"
            );
            self.weights = CategoryWeights::default();
        }
        if !self.pitch_std_good.is_ordered() {
            warn!("pitch_std_good is not an ordered range; using default");
            self.pitch_std_good = defaults.pitch_std_good;
        }
        if !self.wpm_good.is_ordered() {
            warn!("wpm_good is not an ordered range; using default");
            self.wpm_good = defaults.wpm_good;
        }
        if !self.volume_consistency_good.is_finite()
            || !(0.0..=1.0).contains(&self.volume_consistency_good)
        {
            warn!("volume_consistency_good out of range; using default");
            self.volume_consistency_good = defaults.volume_consistency_good;
        }
        if !self.filler_ratio_threshold.is_finite()
            || !(0.0..1.0).contains(&self.filler_ratio_threshold)
        {
            warn!("filler_ratio_threshold out of range; using default");
            self.filler_ratio_threshold = defaults.filler_ratio_threshold;
        }
        if !self.speech_rms_threshold.is_finite() || !(0.0..1.0).contains(&self.speech_rms_threshold)
        {
            warn!("speech_rms_threshold out of range; using default");
            self.speech_rms_threshold = defaults.speech_rms_threshold;
        }
        if self.centroid_norm_hz <= 0.0 {
            warn!("centroid_norm_hz must be positive; using default");
            self.centroid_norm_hz = defaults.centroid_norm_hz;
        }
        if self.mfcc_variance_norm <= 0.0 {
            warn!("mfcc_variance_norm must be positive; using default");
            self.mfcc_variance_norm = defaults.mfcc_variance_norm;
        }
        if self.rate_penalty_divisor <= 0.0 {
            warn!("rate_penalty_divisor must be positive; using default");
            self.rate_penalty_divisor = defaults.rate_penalty_divisor;
        }
        if self.transcribe_timeout_ms == 0 {
            warn!("transcribe_timeout_ms must be non-zero; using default");
            self.transcribe_timeout_ms = defaults.transcribe_timeout_ms;
        }
        if self.probe_timeout_ms == 0 {
            warn!("probe_timeout_ms must be non-zero; using default");
            self.probe_timeout_ms = defaults.probe_timeout_ms;
        }
        if self.filler_words.is_empty() {
            warn!("filler word list is empty; using default list");
            self.filler_words = defaults.filler_words;
        }

        self
    }

    /// Load a config from a JSON file, substituting defaults for any invalid
    /// fields. Parse failures are surfaced as `InvalidConfig`.
    pub fn load(path: &Path) -> Result<Self, CoachError> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: Self = serde_json::from_str(&raw).map_err(|err| {
            CoachError::InvalidConfig(format!("failed to parse '{}': {err}", path.display()))
        })?;
        Ok(parsed.sanitized())
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, CoachError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| CoachError::InvalidConfig(format!("failed to serialize config: {err}")))
    }
}
