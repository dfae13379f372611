//! Volume consistency: RMS energy over sliding sub-windows.

use super::VolumeMetrics;
use crate::audio::AudioWindow;

const SUB_WINDOW: usize = 1024;
const HOP: usize = 512;

pub fn analyze(window: &AudioWindow) -> VolumeMetrics {
    let samples = window.to_f32();
    if samples.len() < SUB_WINDOW {
        return VolumeMetrics::default();
    }

    let mut rms_values = Vec::new();
    let mut start = 0;
    while start + SUB_WINDOW <= samples.len() {
        let energy: f64 = samples[start..start + SUB_WINDOW]
            .iter()
            .map(|&s| f64::from(s) * f64::from(s))
            .sum::<f64>()
            / SUB_WINDOW as f64;
        rms_values.push(energy.sqrt());
        start += HOP;
    }
    if rms_values.is_empty() {
        return VolumeMetrics::default();
    }

    let n = rms_values.len() as f64;
    let mean = rms_values.iter().sum::<f64>() / n;
    let variance = rms_values.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
    let std = variance.sqrt();

    // Lower deviation relative to the mean reads as steadier delivery.
    let consistency = if mean > 0.0 {
        1.0 - (std / mean).min(1.0)
    } else {
        0.0
    };

    VolumeMetrics {
        rms_mean: mean,
        rms_std: std,
        consistency,
        score: (consistency * 100.0).round() as u8,
    }
}
