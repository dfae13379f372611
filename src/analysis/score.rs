//! Score aggregation and threshold-driven alerts.

use super::WindowMetrics;
use crate::config::{AnalyzerConfig, CategoryWeights};
use crate::snapshot::Scores;
use tracing::warn;

/// Sub-scores below this trigger a coaching alert for their category.
const ALERT_SCORE_THRESHOLD: u8 = 70;

/// Combine per-category scores into the overall rating and collect alerts.
///
/// The weight sum is re-checked here so a mis-edited config can never skew
/// the overall score silently; out-of-balance weights fall back to defaults
/// with a warning. Alert rules are evaluated independently, so every
/// matching suggestion is included.
pub fn aggregate(metrics: &WindowMetrics, cfg: &AnalyzerConfig) -> (Scores, Vec<String>) {
    let weights = if cfg.weights.is_normalized() {
        cfg.weights
    } else {
        warn!(
            sum = cfg.weights.sum(),
            "category weights do not sum to 1.0; using default weights"
        );
        CategoryWeights::default()
    };

    let fluency = match (&metrics.fillers, &metrics.rate) {
        (Some(fillers), Some(rate)) => ((u16::from(fillers.score) + u16::from(rate.score)) / 2) as u8,
        _ => 0,
    };

    let overall = (f64::from(metrics.tone.score) * weights.tone
        + f64::from(metrics.clarity.score) * weights.clarity
        + f64::from(metrics.volume.score) * weights.volume
        + f64::from(fluency) * weights.fluency)
        .round() as u8;

    let scores = Scores {
        tone: metrics.tone.score,
        clarity: metrics.clarity.score,
        volume: metrics.volume.score,
        fluency,
        overall,
    };

    (scores, alerts(metrics, &scores, cfg))
}

fn alerts(metrics: &WindowMetrics, scores: &Scores, cfg: &AnalyzerConfig) -> Vec<String> {
    let mut alerts = Vec::new();

    if scores.tone < ALERT_SCORE_THRESHOLD {
        alerts.push("Consider varying your pitch more for natural prosody".to_string());
    }
    if scores.clarity < ALERT_SCORE_THRESHOLD {
        alerts.push("Focus on clear articulation and enunciation".to_string());
    }
    if scores.volume < ALERT_SCORE_THRESHOLD {
        alerts.push("Try to maintain consistent volume levels".to_string());
    }
    if let Some(fillers) = &metrics.fillers {
        if fillers.ratio > cfg.filler_ratio_threshold {
            alerts.push(format!(
                "Reduce filler words ({:.1}% of speech)",
                fillers.ratio * 100.0
            ));
        }
    }
    if let Some(rate) = &metrics.rate {
        if rate.words_per_minute > 0.0 {
            if rate.words_per_minute < cfg.wpm_good.low {
                alerts.push("Consider speaking a bit faster for better engagement".to_string());
            } else if rate.words_per_minute > cfg.wpm_good.high {
                alerts.push("Consider slowing down for better clarity".to_string());
            }
        }
    }

    alerts
}
