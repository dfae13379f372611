//! Audio capture and window slicing.
//!
//! Raw PCM arrives on the capture device's callback thread and is appended to
//! a shared [`SampleBuffer`]. The analysis loop slices fixed-duration,
//! overlapping [`AudioWindow`]s from it at its own cadence; neither side ever
//! holds the buffer lock across real work.

mod buffer;
mod meter;
mod resample;
mod source;

pub use buffer::SampleBuffer;
pub use meter::{has_speech, rms_db, rms_level, LiveMeter};
pub use resample::{resample_linear, resample_to_rate};
pub use source::{list_input_devices, select_input_device, CaptureStream, MONITOR_SOURCE_PATTERNS};

/// One fixed-duration slice of captured audio, immutable once sliced. The
/// slice is a copy, so the live buffer keeps mutating without invalidating
/// in-flight analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioWindow {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioWindow {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Samples normalized to [-1, 1] for feature extraction.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&s| f32::from(s) / 32_767.0)
            .collect()
    }
}
