//! Shared sample buffer between the capture callback and the analysis loop.

use super::AudioWindow;
use std::sync::Mutex;

/// Growable PCM buffer behind a single lock. `append` runs on the capture
/// callback thread; `try_slice_window` runs on the analysis thread. The lock
/// is held only for the copy or drain, never across extraction work.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Mutex<Vec<i16>>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn append(&self, samples: &[i16]) {
        let mut buf = self.lock();
        buf.extend_from_slice(samples);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Slice the oldest `window_len` samples as a window, draining `step_len`
    /// and retaining the `window_len - step_len` overlap tail for the next
    /// slice. Returns `None` until enough samples have accumulated.
    ///
    /// Invariant: the retained tail is exactly the most recent overlap of the
    /// returned window, so consecutive windows share their overlap region and
    /// no sample is lost or duplicated outside it.
    pub fn try_slice_window(&self, window_len: usize, step_len: usize) -> Option<AudioWindow> {
        if window_len == 0 {
            return None;
        }
        let step_len = step_len.clamp(1, window_len);
        let mut buf = self.lock();
        if buf.len() < window_len {
            return None;
        }
        let window = buf[..window_len].to_vec();
        buf.drain(..step_len);
        Some(AudioWindow::new(window, self.sample_rate))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<i16>> {
        self.samples.lock().unwrap_or_else(|e| e.into_inner())
    }
}
