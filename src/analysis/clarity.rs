//! Spectral clarity features: centroid, rolloff, zero-crossing rate, and
//! MFCC variance over short STFT frames.

use super::ClarityMetrics;
use crate::audio::AudioWindow;
use crate::config::AnalyzerConfig;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

const FFT_SIZE: usize = 512;
const HOP_SIZE: usize = 256;
/// Fraction of total spectral energy below the rolloff frequency.
const ROLLOFF_FRACTION: f64 = 0.85;
const MEL_FILTERS: usize = 26;
const MFCC_COUNT: usize = 13;

pub fn analyze(window: &AudioWindow, cfg: &AnalyzerConfig) -> ClarityMetrics {
    let samples = window.to_f32();
    let sr = f64::from(window.sample_rate());
    if samples.len() < FFT_SIZE || sr <= 0.0 {
        return ClarityMetrics::default();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);
    let hann: Vec<f32> = (0..FFT_SIZE)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f64 / (FFT_SIZE - 1) as f64).cos() as f32))
        .collect();
    let bins = FFT_SIZE / 2 + 1;
    let hz_per_bin = sr / FFT_SIZE as f64;
    let mel_bank = mel_filterbank(MEL_FILTERS, bins, sr);

    let mut centroids = Vec::new();
    let mut rolloffs = Vec::new();
    let mut zcrs = Vec::new();
    let mut mfcc_frames: Vec<Vec<f64>> = Vec::new();

    let mut start = 0;
    while start + FFT_SIZE <= samples.len() {
        let frame = &samples[start..start + FFT_SIZE];
        zcrs.push(zero_crossing_rate(frame));

        let mut spectrum: Vec<Complex<f32>> = frame
            .iter()
            .zip(&hann)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut spectrum);
        let power: Vec<f64> = spectrum[..bins]
            .iter()
            .map(|c| f64::from(c.norm_sqr()))
            .collect();
        let total: f64 = power.iter().sum();

        if total > 0.0 {
            let centroid = power
                .iter()
                .enumerate()
                .map(|(k, &p)| k as f64 * hz_per_bin * p)
                .sum::<f64>()
                / total;
            centroids.push(centroid);

            let mut cumulative = 0.0;
            let mut rolloff = (bins - 1) as f64 * hz_per_bin;
            for (k, &p) in power.iter().enumerate() {
                cumulative += p;
                if cumulative >= ROLLOFF_FRACTION * total {
                    rolloff = k as f64 * hz_per_bin;
                    break;
                }
            }
            rolloffs.push(rolloff);
        }

        mfcc_frames.push(mfcc(&power, &mel_bank));
        start += HOP_SIZE;
    }

    if centroids.is_empty() {
        // Whole window was spectral silence.
        return ClarityMetrics {
            zero_crossing_rate_mean: mean(&zcrs),
            ..ClarityMetrics::default()
        };
    }

    let centroid_mean = mean(&centroids);
    let rolloff_mean = mean(&rolloffs);
    let zcr_mean = mean(&zcrs);
    let mfcc_variance = mean_coefficient_variance(&mfcc_frames);

    // Brighter spectra and richer cepstral movement read as clearer speech.
    // The divisors are empirical calibration constants from configuration.
    let centroid_norm = (centroid_mean / cfg.centroid_norm_hz).min(1.0);
    let variance_norm = (mfcc_variance / cfg.mfcc_variance_norm).min(1.0);
    let score = (100.0 * (0.6 * centroid_norm + 0.4 * variance_norm)).round() as u8;

    ClarityMetrics {
        spectral_centroid_mean: centroid_mean,
        spectral_rolloff_mean: rolloff_mean,
        zero_crossing_rate_mean: zcr_mean,
        mfcc_variance,
        score,
    }
}

fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / (frame.len() - 1) as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean over coefficients of the per-coefficient variance across frames.
fn mean_coefficient_variance(frames: &[Vec<f64>]) -> f64 {
    if frames.is_empty() || frames[0].is_empty() {
        return 0.0;
    }
    let coeffs = frames[0].len();
    let n = frames.len() as f64;
    let mut total = 0.0;
    for c in 0..coeffs {
        let mean_c = frames.iter().map(|f| f[c]).sum::<f64>() / n;
        let var_c = frames.iter().map(|f| (f[c] - mean_c).powi(2)).sum::<f64>() / n;
        total += var_c;
    }
    total / coeffs as f64
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the power-spectrum bins.
fn mel_filterbank(filters: usize, bins: usize, sr: f64) -> Vec<Vec<f64>> {
    let hz_per_bin = sr / ((bins - 1) * 2) as f64;
    let mel_max = hz_to_mel(sr / 2.0);
    let centers: Vec<f64> = (0..filters + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (filters + 1) as f64) / hz_per_bin)
        .collect();

    let mut bank = Vec::with_capacity(filters);
    for f in 0..filters {
        let (left, center, right) = (centers[f], centers[f + 1], centers[f + 2]);
        let mut filter = vec![0.0; bins];
        for (k, weight) in filter.iter_mut().enumerate() {
            let k = k as f64;
            if k > left && k < center {
                *weight = (k - left) / (center - left);
            } else if k >= center && k < right {
                *weight = (right - k) / (right - center);
            }
        }
        bank.push(filter);
    }
    bank
}

/// Cepstral coefficients: log mel energies followed by a DCT-II.
fn mfcc(power: &[f64], mel_bank: &[Vec<f64>]) -> Vec<f64> {
    let log_mel: Vec<f64> = mel_bank
        .iter()
        .map(|filter| {
            let energy: f64 = filter.iter().zip(power).map(|(w, p)| w * p).sum();
            (energy + 1e-10).ln()
        })
        .collect();

    let m = log_mel.len() as f64;
    (0..MFCC_COUNT)
        .map(|c| {
            log_mel
                .iter()
                .enumerate()
                .map(|(i, &e)| e * (PI * c as f64 * (i as f64 + 0.5) / m).cos())
                .sum()
        })
        .collect()
}
