//! Input level metering and the speech/silence gate.

use super::AudioWindow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const METER_FLOOR_DB: f32 = -60.0;

/// Lock-free live input level, shared between the capture callback and any
/// UI that wants to draw a meter.
#[derive(Clone, Debug)]
pub struct LiveMeter {
    level_bits: Arc<AtomicU32>,
}

impl LiveMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(METER_FLOOR_DB.to_bits())),
        }
    }

    pub fn set_db(&self, db: f32) {
        self.level_bits.store(db.to_bits(), Ordering::Relaxed);
    }

    pub fn level_db(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }

    pub fn reset(&self) {
        self.set_db(METER_FLOOR_DB);
    }
}

impl Default for LiveMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// RMS of normalized samples, in decibels. Floored for empty input.
pub fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return METER_FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    20.0 * rms.log10()
}

/// Linear RMS of i16 samples normalized to [0, 1].
pub fn rms_level(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f64 = samples
        .iter()
        .map(|&s| {
            let v = f64::from(s) / 32_767.0;
            v * v
        })
        .sum::<f64>()
        / samples.len() as f64;
    energy.sqrt()
}

/// Energy gate that lets the pipeline skip transcription and extraction for
/// dead air. Threshold is configuration (normalized RMS).
pub fn has_speech(window: &AudioWindow, threshold: f64) -> bool {
    rms_level(window.samples()) > threshold
}
