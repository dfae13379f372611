//! Pitch contour extraction and prosody scoring.
//!
//! Pitch is tracked with a normalized autocorrelation over short hops.
//! Unvoiced frames (low energy or no clear periodicity) are discarded; if
//! nothing voiced remains the window scores 0, which covers silence and
//! unpitched noise.

use super::ToneMetrics;
use crate::audio::AudioWindow;
use crate::config::AnalyzerConfig;

/// Contour hop, matching the 10ms analysis step of the pitch track.
const HOP_SECS: f64 = 0.01;
const FRAME_SECS: f64 = 0.03;
/// Search band for fundamental frequency. Covers typical speaking voices
/// with headroom on both ends.
const PITCH_MIN_HZ: f64 = 50.0;
const PITCH_MAX_HZ: f64 = 500.0;
/// Minimum normalized autocorrelation peak to call a frame voiced.
const VOICING_THRESHOLD: f64 = 0.3;
/// Frames quieter than this RMS are skipped outright.
const FRAME_RMS_FLOOR: f64 = 1e-3;

pub fn analyze(window: &AudioWindow, cfg: &AnalyzerConfig) -> ToneMetrics {
    let contour = pitch_contour(window);
    if contour.is_empty() {
        return ToneMetrics::default();
    }

    let n = contour.len() as f64;
    let mean = contour.iter().sum::<f64>() / n;
    let variance = contour.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / n;
    let std = variance.sqrt();
    let min = contour.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = contour.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    // Monotone delivery is penalized harder than over-animated delivery.
    let score = if cfg.pitch_std_good.contains(std) {
        100
    } else if std < cfg.pitch_std_good.low {
        50
    } else {
        70
    };

    ToneMetrics {
        pitch_mean: mean,
        pitch_std: std,
        pitch_range: max - min,
        score,
    }
}

/// Voiced pitch estimates, one per 10ms hop, in Hz.
pub fn pitch_contour(window: &AudioWindow) -> Vec<f64> {
    let sr = f64::from(window.sample_rate());
    if sr <= 0.0 {
        return Vec::new();
    }
    let samples: Vec<f64> = window
        .samples()
        .iter()
        .map(|&s| f64::from(s) / 32_767.0)
        .collect();
    let hop = (sr * HOP_SECS).round().max(1.0) as usize;
    let frame_len = (sr * FRAME_SECS).round() as usize;
    let max_lag = (sr / PITCH_MIN_HZ).ceil() as usize;
    if frame_len <= max_lag || samples.len() < frame_len {
        return Vec::new();
    }

    let mut contour = Vec::new();
    let mut start = 0;
    while start + frame_len <= samples.len() {
        if let Some(hz) = frame_pitch(&samples[start..start + frame_len], sr) {
            contour.push(hz);
        }
        start += hop;
    }
    contour
}

/// Autocorrelation pitch estimate for one frame, or `None` when unvoiced.
fn frame_pitch(frame: &[f64], sr: f64) -> Option<f64> {
    let n = frame.len();
    let mean = frame.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = frame.iter().map(|s| s - mean).collect();

    let energy = centered.iter().map(|s| s * s).sum::<f64>() / n as f64;
    if energy.sqrt() < FRAME_RMS_FLOOR {
        return None;
    }

    let min_lag = (sr / PITCH_MAX_HZ).floor().max(1.0) as usize;
    let max_lag = ((sr / PITCH_MIN_HZ).ceil() as usize).min(n - 1);
    let r0 = centered.iter().map(|s| s * s).sum::<f64>() / n as f64;
    if r0 <= 0.0 {
        return None;
    }

    // Per-lag mean so long lags (fewer product terms) are not biased low.
    let corr_at = |lag: usize| -> f64 {
        let count = n - lag;
        let sum: f64 = (0..count).map(|i| centered[i] * centered[i + lag]).sum();
        (sum / count as f64) / r0
    };

    let mut best_lag = 0;
    let mut best_corr = 0.0;
    for lag in min_lag..=max_lag {
        let c = corr_at(lag);
        if c > best_corr {
            best_corr = c;
            best_lag = lag;
        }
    }
    if best_corr < VOICING_THRESHOLD || best_lag == 0 {
        return None;
    }

    // Parabolic interpolation around the peak for sub-sample lag precision.
    let refined = if best_lag > min_lag && best_lag < max_lag {
        let left = corr_at(best_lag - 1);
        let right = corr_at(best_lag + 1);
        let denom = left - 2.0 * best_corr + right;
        if denom.abs() > 1e-12 {
            let delta = 0.5 * (left - right) / denom;
            best_lag as f64 + delta.clamp(-0.5, 0.5)
        } else {
            best_lag as f64
        }
    } else {
        best_lag as f64
    };

    Some(sr / refined)
}
