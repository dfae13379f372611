use super::{
    aggregate, analyze_window, clarity, fluency, prosody, volume, FillerMetrics, RateMetrics,
    ToneMetrics, WindowMetrics,
};
use crate::audio::AudioWindow;
use crate::config::{AnalyzerConfig, CategoryWeights};
use std::f64::consts::PI;

const SAMPLE_RATE: u32 = 16_000;

fn sine_window(freq: f64, secs: f64, amplitude: f64) -> AudioWindow {
    let count = (secs * f64::from(SAMPLE_RATE)) as usize;
    let samples = (0..count)
        .map(|i| {
            let t = i as f64 / f64::from(SAMPLE_RATE);
            (amplitude * (2.0 * PI * freq * t).sin() * 32_767.0) as i16
        })
        .collect();
    AudioWindow::new(samples, SAMPLE_RATE)
}

/// Sine with a slow linear frequency sweep, giving real pitch variation.
fn sweep_window(start_hz: f64, end_hz: f64, secs: f64) -> AudioWindow {
    let count = (secs * f64::from(SAMPLE_RATE)) as usize;
    let mut phase = 0.0f64;
    let samples = (0..count)
        .map(|i| {
            let frac = i as f64 / count as f64;
            let freq = start_hz + (end_hz - start_hz) * frac;
            phase += 2.0 * PI * freq / f64::from(SAMPLE_RATE);
            (0.5 * phase.sin() * 32_767.0) as i16
        })
        .collect();
    AudioWindow::new(samples, SAMPLE_RATE)
}

// --- prosody ---

#[test]
fn monotone_tone_scores_fifty() {
    let cfg = AnalyzerConfig::default();
    let window = sine_window(220.0, 3.0, 0.5);
    let tone = prosody::analyze(&window, &cfg);
    assert!(tone.pitch_std < cfg.pitch_std_good.low, "std {}", tone.pitch_std);
    assert_eq!(tone.score, 50);
    assert!(
        (tone.pitch_mean - 220.0).abs() < 10.0,
        "mean {}",
        tone.pitch_mean
    );
}

#[test]
fn silence_yields_zero_tone_metrics() {
    let cfg = AnalyzerConfig::default();
    let window = AudioWindow::new(vec![0; 48_000], SAMPLE_RATE);
    let tone = prosody::analyze(&window, &cfg);
    assert_eq!(tone, ToneMetrics::default());
}

#[test]
fn varied_pitch_in_good_range_scores_full() {
    let cfg = AnalyzerConfig::default();
    // 120Hz..420Hz sweep: std of a uniform-ish contour is well inside 50..150
    let window = sweep_window(120.0, 420.0, 3.0);
    let tone = prosody::analyze(&window, &cfg);
    assert!(tone.pitch_std > cfg.pitch_std_good.low, "std {}", tone.pitch_std);
    assert!(tone.pitch_std < cfg.pitch_std_good.high, "std {}", tone.pitch_std);
    assert_eq!(tone.score, 100);
}

#[test]
fn short_window_cannot_fit_a_frame() {
    let cfg = AnalyzerConfig::default();
    let window = AudioWindow::new(vec![1000; 64], SAMPLE_RATE);
    assert_eq!(prosody::analyze(&window, &cfg), ToneMetrics::default());
}

// --- clarity ---

#[test]
fn clarity_of_silence_is_zero() {
    let cfg = AnalyzerConfig::default();
    let window = AudioWindow::new(vec![0; 16_000], SAMPLE_RATE);
    let clarity = clarity::analyze(&window, &cfg);
    assert_eq!(clarity.score, 0);
    assert_eq!(clarity.spectral_centroid_mean, 0.0);
}

#[test]
fn clarity_centroid_tracks_tone_frequency() {
    let cfg = AnalyzerConfig::default();
    let low = clarity::analyze(&sine_window(300.0, 1.0, 0.5), &cfg);
    let high = clarity::analyze(&sine_window(3000.0, 1.0, 0.5), &cfg);
    assert!(
        high.spectral_centroid_mean > low.spectral_centroid_mean * 2.0,
        "low {} high {}",
        low.spectral_centroid_mean,
        high.spectral_centroid_mean
    );
    assert!(high.score > low.score);
}

#[test]
fn clarity_rolloff_bounds_the_centroid() {
    let cfg = AnalyzerConfig::default();
    let metrics = clarity::analyze(&sine_window(1000.0, 1.0, 0.5), &cfg);
    assert!(metrics.spectral_rolloff_mean > 0.0);
    assert!(metrics.spectral_centroid_mean > 0.0);
}

#[test]
fn clarity_zcr_rises_with_frequency() {
    let cfg = AnalyzerConfig::default();
    let low = clarity::analyze(&sine_window(200.0, 1.0, 0.5), &cfg);
    let high = clarity::analyze(&sine_window(2000.0, 1.0, 0.5), &cfg);
    assert!(high.zero_crossing_rate_mean > low.zero_crossing_rate_mean * 5.0);
}

#[test]
fn clarity_on_tiny_window_degrades_to_zero() {
    let cfg = AnalyzerConfig::default();
    let window = AudioWindow::new(vec![5000; 100], SAMPLE_RATE);
    assert_eq!(clarity::analyze(&window, &cfg).score, 0);
}

// --- volume ---

#[test]
fn steady_tone_has_high_volume_consistency() {
    let window = sine_window(220.0, 2.0, 0.5);
    let metrics = volume::analyze(&window);
    assert!(metrics.consistency > 0.9, "consistency {}", metrics.consistency);
    assert!(metrics.score >= 90);
}

#[test]
fn erratic_amplitude_scores_lower_than_steady() {
    let steady = volume::analyze(&sine_window(220.0, 2.0, 0.5));

    // alternate loud and near-silent half-second stretches
    let mut samples = Vec::new();
    for block in 0..4 {
        let amp = if block % 2 == 0 { 0.8 } else { 0.02 };
        samples.extend(sine_window(220.0, 0.5, amp).samples().to_vec());
    }
    let erratic = volume::analyze(&AudioWindow::new(samples, SAMPLE_RATE));

    assert!(erratic.score < steady.score);
    assert!(erratic.consistency < 0.6, "consistency {}", erratic.consistency);
}

#[test]
fn volume_of_silence_is_zero() {
    let window = AudioWindow::new(vec![0; 8_192], SAMPLE_RATE);
    let metrics = volume::analyze(&window);
    assert_eq!(metrics.consistency, 0.0);
    assert_eq!(metrics.score, 0);
}

// --- fluency: fillers ---

#[test]
fn empty_transcript_scores_full_fillers() {
    let cfg = AnalyzerConfig::default();
    let metrics = fluency::analyze_fillers("", &cfg);
    assert_eq!(metrics.ratio, 0.0);
    assert_eq!(metrics.score, 100);
}

#[test]
fn clean_speech_stays_at_full_filler_score() {
    let cfg = AnalyzerConfig::default();
    let metrics = fluency::analyze_fillers("the quick brown fox jumps over the lazy dog", &cfg);
    assert_eq!(metrics.count, 0);
    assert_eq!(metrics.score, 100);
}

#[test]
fn filler_ratio_and_types_are_reported() {
    let cfg = AnalyzerConfig::default();
    let metrics = fluency::analyze_fillers("um well the Um result was uh fine", &cfg);
    assert_eq!(metrics.count, 4); // um, well, um, uh
    assert!((metrics.ratio - 4.0 / 8.0).abs() < 1e-9);
    assert_eq!(metrics.types, vec!["uh", "um", "well"]);
}

#[test]
fn filler_score_decreases_monotonically_above_threshold() {
    let cfg = AnalyzerConfig::default();
    // 100 words total; ratios 6%..9% sit between the threshold and the
    // score floor, so each extra filler must cost points
    let mut previous = u8::MAX;
    for fillers in 6..=9 {
        let mut words: Vec<&str> = vec!["um"; fillers];
        words.resize(100, "word");
        let text = words.join(" ");
        let metrics = fluency::analyze_fillers(&text, &cfg);
        assert!(
            metrics.score < previous,
            "score {} did not drop below {previous} at {fillers} fillers",
            metrics.score
        );
        previous = metrics.score;
    }
}

#[test]
fn filler_score_floors_at_zero() {
    let cfg = AnalyzerConfig::default();
    let metrics = fluency::analyze_fillers("um um um um um", &cfg);
    assert_eq!(metrics.ratio, 1.0);
    assert_eq!(metrics.score, 0);
}

// --- fluency: rate ---

#[test]
fn rate_at_band_bounds_scores_full() {
    let cfg = AnalyzerConfig::default();
    // 150 WPM over 60s = 150 words; 200 WPM = 200 words
    let low_text = vec!["word"; 150].join(" ");
    let high_text = vec!["word"; 200].join(" ");
    assert_eq!(fluency::analyze_rate(&low_text, 60.0, &cfg).score, 100);
    assert_eq!(fluency::analyze_rate(&high_text, 60.0, &cfg).score, 100);
}

#[test]
fn rate_below_band_is_proportional() {
    let cfg = AnalyzerConfig::default();
    let text = vec!["word"; 75].join(" "); // 75 WPM over 60s, half the lower bound
    let metrics = fluency::analyze_rate(&text, 60.0, &cfg);
    assert_eq!(metrics.score, 50);
}

#[test]
fn rate_far_above_band_floors_at_zero() {
    let cfg = AnalyzerConfig::default();
    let text = vec!["word"; 700].join(" "); // 700 WPM: penalty (700-200)/2 = 250
    let metrics = fluency::analyze_rate(&text, 60.0, &cfg);
    assert_eq!(metrics.score, 0);
}

#[test]
fn rate_slightly_above_band_is_softened_by_divisor() {
    let cfg = AnalyzerConfig::default();
    let text = vec!["word"; 220].join(" "); // 220 WPM: 100 - 20/2 = 90
    let metrics = fluency::analyze_rate(&text, 60.0, &cfg);
    assert_eq!(metrics.score, 90);
}

#[test]
fn empty_transcript_rate_is_zero() {
    let cfg = AnalyzerConfig::default();
    assert_eq!(fluency::analyze_rate("", 3.0, &cfg), RateMetrics::default());
}

// --- aggregation ---

fn metrics_with_scores(tone: u8, clarity: u8, volume: u8, fillers: u8, rate: u8) -> WindowMetrics {
    WindowMetrics {
        tone: ToneMetrics {
            pitch_mean: 180.0,
            pitch_std: 80.0,
            pitch_range: 120.0,
            score: tone,
        },
        clarity: super::ClarityMetrics {
            spectral_centroid_mean: 1500.0,
            spectral_rolloff_mean: 3000.0,
            zero_crossing_rate_mean: 0.1,
            mfcc_variance: 50.0,
            score: clarity,
        },
        volume: super::VolumeMetrics {
            rms_mean: 0.2,
            rms_std: 0.02,
            consistency: 0.9,
            score: volume,
        },
        fillers: Some(FillerMetrics {
            count: 0,
            ratio: 0.0,
            types: Vec::new(),
            score: fillers,
        }),
        rate: Some(RateMetrics {
            words_per_minute: 170.0,
            word_count: 100,
            score: rate,
        }),
    }
}

#[test]
fn overall_is_the_weighted_sum() {
    let cfg = AnalyzerConfig::default();
    let metrics = metrics_with_scores(80, 80, 80, 100, 100);
    let (scores, alerts) = aggregate(&metrics, &cfg);
    assert_eq!(scores.fluency, 100);
    // 80*0.25 + 80*0.25 + 80*0.20 + 100*0.30 = 86
    assert_eq!(scores.overall, 86);
    assert!(alerts.is_empty());
}

#[test]
fn fluency_is_the_mean_of_filler_and_rate_scores() {
    let cfg = AnalyzerConfig::default();
    let metrics = metrics_with_scores(80, 80, 80, 40, 90);
    let (scores, _) = aggregate(&metrics, &cfg);
    assert_eq!(scores.fluency, 65);
}

#[test]
fn missing_transcript_categories_zero_fluency_without_alerts() {
    let cfg = AnalyzerConfig::default();
    let mut metrics = metrics_with_scores(90, 90, 90, 0, 0);
    metrics.fillers = None;
    metrics.rate = None;
    let (scores, alerts) = aggregate(&metrics, &cfg);
    assert_eq!(scores.fluency, 0);
    // no filler or rate alerts when their metrics were never computed
    assert!(alerts.iter().all(|a| !a.contains("filler") && !a.contains("speaking")));
}

#[test]
fn unbalanced_weights_fall_back_to_defaults() {
    let mut cfg = AnalyzerConfig::default();
    cfg.weights = CategoryWeights {
        tone: 1.0,
        clarity: 1.0,
        volume: 1.0,
        fluency: 1.0,
    };
    let metrics = metrics_with_scores(80, 80, 80, 100, 100);
    let (scores, _) = aggregate(&metrics, &cfg);
    // default weights, not the bogus sum-4 ones
    assert_eq!(scores.overall, 86);
}

#[test]
fn low_category_scores_raise_their_alerts() {
    let cfg = AnalyzerConfig::default();
    let metrics = metrics_with_scores(50, 60, 69, 100, 100);
    let (_, alerts) = aggregate(&metrics, &cfg);
    assert_eq!(alerts.len(), 3);
    assert!(alerts[0].contains("pitch"));
    assert!(alerts[1].contains("articulation"));
    assert!(alerts[2].contains("volume"));
}

#[test]
fn filler_alert_embeds_the_observed_percentage() {
    let cfg = AnalyzerConfig::default();
    let mut metrics = metrics_with_scores(90, 90, 90, 0, 100);
    metrics.fillers = Some(FillerMetrics {
        count: 3,
        ratio: 0.6,
        types: vec!["um".to_string()],
        score: 0,
    });
    let (_, alerts) = aggregate(&metrics, &cfg);
    assert!(
        alerts.iter().any(|a| a == "Reduce filler words (60.0% of speech)"),
        "alerts: {alerts:?}"
    );
}

#[test]
fn rate_alerts_match_band_direction() {
    let cfg = AnalyzerConfig::default();

    let mut slow = metrics_with_scores(90, 90, 90, 100, 60);
    slow.rate = Some(RateMetrics {
        words_per_minute: 90.0,
        word_count: 30,
        score: 60,
    });
    let (_, alerts) = aggregate(&slow, &cfg);
    assert!(alerts.iter().any(|a| a.contains("faster")));

    let mut fast = metrics_with_scores(90, 90, 90, 100, 60);
    fast.rate = Some(RateMetrics {
        words_per_minute: 260.0,
        word_count: 100,
        score: 70,
    });
    let (_, alerts) = aggregate(&fast, &cfg);
    assert!(alerts.iter().any(|a| a.contains("slowing down")));
}

// --- full window analysis ---

#[test]
fn analyze_window_combines_audio_and_transcript() {
    let cfg = AnalyzerConfig::default();
    let window = sine_window(220.0, 3.0, 0.5);
    let (metrics, scores, alerts) = analyze_window(&window, "um um um test test", &cfg);

    assert_eq!(metrics.tone.score, 50); // monotone
    let fillers = metrics.fillers.as_ref().expect("fillers computed");
    assert!((fillers.ratio - 0.6).abs() < 1e-9);
    assert_eq!(fillers.score, 0);
    assert!(alerts.iter().any(|a| a == "Reduce filler words (60.0% of speech)"));
    assert!(scores.overall < 70);
}

#[test]
fn analyze_window_without_transcript_skips_fluency() {
    let cfg = AnalyzerConfig::default();
    let window = sine_window(220.0, 3.0, 0.5);
    let (metrics, scores, _) = analyze_window(&window, "  ", &cfg);
    assert!(metrics.fillers.is_none());
    assert!(metrics.rate.is_none());
    assert_eq!(scores.fluency, 0);
}
