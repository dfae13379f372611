//! Sample-rate conversion for devices that cannot deliver the target rate.
//!
//! Linear interpolation is enough here: the analysis features are coarse
//! statistics and the transcription engine does its own filtering.

/// Resample by the given output/input ratio using linear interpolation.
pub fn resample_linear(input: &[f32], ratio: f64) -> Vec<f32> {
    if input.is_empty() || ratio <= 0.0 {
        return Vec::new();
    }
    let out_len = ((input.len() as f64) * ratio).round().max(1.0) as usize;
    let mut output = Vec::with_capacity(out_len);
    let last = input.len() - 1;
    for i in 0..out_len {
        let pos = i as f64 / ratio;
        let idx = pos.floor() as usize;
        if idx >= last {
            output.push(input[last]);
            continue;
        }
        let frac = (pos - idx as f64) as f32;
        let a = input[idx];
        let b = input[idx + 1];
        output.push(a + (b - a) * frac);
    }
    output
}

/// Convert a chunk from the device rate to the pipeline rate. Identity when
/// the rates already match.
pub fn resample_to_rate(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return input.to_vec();
    }
    resample_linear(input, f64::from(to_rate) / f64::from(from_rate))
}
