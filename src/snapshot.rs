//! Published analysis results.
//!
//! A snapshot is immutable: the next window supersedes it, nothing mutates
//! it in place. The field names and types here are the contract with the UI
//! layer and any export consumer.

use crate::analysis::WindowMetrics;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-category and overall ratings in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub tone: u8,
    pub clarity: u8,
    pub volume: u8,
    pub fluency: u8,
    pub overall: u8,
}

/// Everything the core publishes for one analyzed window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    /// Unix epoch milliseconds when the snapshot was produced.
    pub timestamp_ms: u64,
    pub duration_secs: f64,
    /// Best-effort transcript, possibly empty.
    pub transcription: String,
    pub metrics: WindowMetrics,
    pub scores: Scores,
    pub alerts: Vec<String>,
}

impl AnalysisSnapshot {
    /// Zero snapshot published for windows the speech gate filtered out.
    pub fn silent(duration_secs: f64) -> Self {
        Self {
            timestamp_ms: unix_millis(),
            duration_secs,
            ..Self::default()
        }
    }
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
