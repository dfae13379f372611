//! Transcript-derived fluency: filler-word ratio and speaking rate.

use super::{FillerMetrics, RateMetrics};
use crate::config::AnalyzerConfig;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

fn word_regex() -> &'static Regex {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();
    WORD_RE.get_or_init(|| Regex::new(r"\b\w+\b").expect("word regex should compile"))
}

/// Lower-cased word-boundary tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Count configured filler tokens. Zero tokens means zero ratio and a full
/// score: absence of speech is not disfluency.
pub fn analyze_fillers(text: &str, cfg: &AnalyzerConfig) -> FillerMetrics {
    let words = tokenize(text);
    if words.is_empty() {
        return FillerMetrics {
            score: 100,
            ..FillerMetrics::default()
        };
    }

    let filler_set: HashSet<&str> = cfg.filler_words.iter().map(String::as_str).collect();
    let mut count = 0;
    let mut found = BTreeSet::new();
    for word in &words {
        if filler_set.contains(word.as_str()) {
            count += 1;
            found.insert(word.clone());
        }
    }

    let ratio = count as f64 / words.len() as f64;
    let score = if ratio <= cfg.filler_ratio_threshold {
        100
    } else {
        (100.0 - ratio * 1000.0).floor().max(0.0) as u8
    };

    FillerMetrics {
        count,
        ratio,
        types: found.into_iter().collect(),
        score,
    }
}

/// Words per minute against the configured comfortable band. Too slow is
/// scored proportionally; too fast is penalized by the configured divisor.
pub fn analyze_rate(text: &str, duration_secs: f64, cfg: &AnalyzerConfig) -> RateMetrics {
    let words = tokenize(text);
    if words.is_empty() || duration_secs <= 0.0 {
        return RateMetrics::default();
    }

    let word_count = words.len();
    let wpm = word_count as f64 / duration_secs * 60.0;

    let score = if cfg.wpm_good.contains(wpm) {
        100
    } else if wpm < cfg.wpm_good.low {
        ((wpm / cfg.wpm_good.low) * 100.0).floor().clamp(0.0, 100.0) as u8
    } else {
        let penalty = (wpm - cfg.wpm_good.high) / cfg.rate_penalty_divisor;
        (100.0 - penalty).floor().clamp(0.0, 100.0) as u8
    };

    RateMetrics {
        words_per_minute: wpm,
        word_count,
        score,
    }
}
