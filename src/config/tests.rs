use super::{AnalyzerConfig, CategoryWeights, GoodRange, WEIGHT_SUM_TOLERANCE};
use std::io::Write;

#[test]
fn defaults_pass_strict_validation() {
    AnalyzerConfig::default()
        .validate()
        .expect("defaults should be valid");
}

#[test]
fn default_weights_sum_to_one() {
    let weights = CategoryWeights::default();
    assert!((weights.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
    assert!(weights.is_normalized());
}

#[test]
fn validate_rejects_unnormalized_weights() {
    let mut cfg = AnalyzerConfig::default();
    cfg.weights.tone = 0.5;
    let err = cfg.validate().expect_err("weight sum 1.25 should fail");
    assert!(err.to_string().contains("weights"), "got: {err}");
}

#[test]
fn validate_rejects_overlap_not_shorter_than_window() {
    let mut cfg = AnalyzerConfig::default();
    cfg.overlap_secs = cfg.window_secs;
    assert!(cfg.validate().is_err());
}

#[test]
fn sanitized_restores_default_weights() {
    let mut cfg = AnalyzerConfig::default();
    cfg.weights = CategoryWeights {
        tone: 0.9,
        clarity: 0.9,
        volume: 0.9,
        fluency: 0.9,
    };
    let cfg = cfg.sanitized();
    assert_eq!(cfg.weights, CategoryWeights::default());
}

#[test]
fn sanitized_fixes_overlap_but_keeps_valid_fields() {
    let mut cfg = AnalyzerConfig::default();
    cfg.overlap_secs = 5.0; // longer than the 3s window
    cfg.wpm_good = GoodRange::new(120.0, 180.0);
    let cfg = cfg.sanitized();
    assert!(cfg.overlap_secs < cfg.window_secs);
    assert_eq!(cfg.wpm_good, GoodRange::new(120.0, 180.0));
}

#[test]
fn sanitized_replaces_empty_filler_list() {
    let mut cfg = AnalyzerConfig::default();
    cfg.filler_words.clear();
    let cfg = cfg.sanitized();
    assert!(cfg.filler_words.iter().any(|w| w == "um"));
}

#[test]
fn window_geometry_is_sample_accurate() {
    let cfg = AnalyzerConfig::default();
    assert_eq!(cfg.window_samples(), 48_000); // 3.0s @ 16kHz
    assert_eq!(cfg.overlap_samples(), 8_000); // 0.5s @ 16kHz
    assert_eq!(cfg.step_samples(), 40_000);
}

#[test]
fn json_round_trip_preserves_every_field() {
    let mut cfg = AnalyzerConfig::default();
    cfg.pitch_std_good = GoodRange::new(42.5, 137.25);
    cfg.weights = CategoryWeights {
        tone: 0.3,
        clarity: 0.2,
        volume: 0.2,
        fluency: 0.3,
    };
    cfg.filler_ratio_threshold = 0.0625;

    let json = cfg.to_json().expect("serialize");
    let reloaded: AnalyzerConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(reloaded, cfg);
}

#[test]
fn load_sanitizes_bad_fields_from_disk() {
    let mut cfg = AnalyzerConfig::default();
    cfg.weights.fluency = 0.9; // sum 1.6
    let json = cfg.to_json().expect("serialize");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(json.as_bytes()).expect("write config");

    let loaded = AnalyzerConfig::load(file.path()).expect("load");
    assert_eq!(loaded.weights, CategoryWeights::default());
}

#[test]
fn load_reports_parse_failures() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"not json").expect("write");
    assert!(AnalyzerConfig::load(file.path()).is_err());
}

#[test]
fn good_range_bounds_are_inclusive() {
    let range = GoodRange::new(150.0, 200.0);
    assert!(range.contains(150.0));
    assert!(range.contains(200.0));
    assert!(!range.contains(149.999));
    assert!(!range.contains(200.001));
}
