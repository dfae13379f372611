//! Capture device selection and the live input stream.
//!
//! The selection rule is deterministic: an explicit name wins, then known
//! monitor-source names (system audio loopback), then the first source whose
//! name looks like a monitor. Without any of those a session cannot start.

use super::buffer::SampleBuffer;
use super::meter::{rms_db, LiveMeter};
use super::resample::resample_to_rate;
use crate::error::CoachError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::Arc;
use tracing::{debug, info};

/// Monitor source names commonly exposed by PulseAudio/PipeWire setups,
/// checked in order.
pub const MONITOR_SOURCE_PATTERNS: &[&str] = &[
    "auto_null.monitor",
    "alsa_output.pci-0000_00_1f.3.analog-stereo.monitor",
    "alsa_output.platform-snd_aloop.0.analog-stereo.monitor",
];

/// Names of every capture source the host exposes.
pub fn list_input_devices() -> Result<Vec<String>, CoachError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|err| CoachError::Capture(format!("failed to enumerate input devices: {err}")))?;
    let mut names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            names.push(name);
        }
    }
    Ok(names)
}

/// Pick the capture source for a session.
///
/// An explicit `preferred` name must match exactly. Otherwise known monitor
/// names are tried in order, then any source containing "monitor". Fails with
/// `NoSourceFound` when nothing usable exists.
pub fn select_input_device(preferred: Option<&str>) -> Result<cpal::Device, CoachError> {
    let host = cpal::default_host();
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|err| CoachError::Capture(format!("failed to enumerate input devices: {err}")))?
        .collect();

    if let Some(wanted) = preferred {
        return devices
            .into_iter()
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or(CoachError::NoSourceFound);
    }

    for pattern in MONITOR_SOURCE_PATTERNS {
        if let Some(idx) = devices
            .iter()
            .position(|d| d.name().map(|n| n == *pattern).unwrap_or(false))
        {
            info!(source = pattern, "selected known monitor source");
            return Ok(devices.into_iter().nth(idx).expect("index in range"));
        }
    }

    if let Some(idx) = devices.iter().position(|d| {
        d.name()
            .map(|n| n.to_ascii_lowercase().contains("monitor"))
            .unwrap_or(false)
    }) {
        if let Ok(name) = devices[idx].name() {
            info!(source = %name, "selected fallback monitor source");
        }
        return Ok(devices.into_iter().nth(idx).expect("index in range"));
    }

    Err(CoachError::NoSourceFound)
}

/// A running capture stream feeding the shared buffer. Dropping it releases
/// the device.
pub struct CaptureStream {
    stream: cpal::Stream,
    device_name: String,
}

impl CaptureStream {
    /// Build and start the input stream. Samples are converted to f32,
    /// downmixed to mono, resampled to `target_rate`, and appended to the
    /// buffer as i16 PCM. The callback's buffer critical section is a single
    /// append.
    pub fn open(
        device: &cpal::Device,
        buffer: Arc<SampleBuffer>,
        meter: LiveMeter,
        target_rate: u32,
    ) -> Result<Self, CoachError> {
        let default_config = device
            .default_input_config()
            .map_err(|err| CoachError::Capture(format!("no default input config: {err}")))?;
        let format = default_config.sample_format();
        let stream_config: StreamConfig = default_config.into();
        let device_rate = stream_config.sample_rate.0;
        let channels = usize::from(stream_config.channels.max(1));
        let device_name = device
            .name()
            .unwrap_or_else(|_| "unknown input device".to_string());

        debug!(
            device = %device_name,
            ?format,
            device_rate,
            channels,
            target_rate,
            "opening capture stream"
        );

        let err_fn = |err| debug!("audio stream error: {err}");
        let stream = match format {
            SampleFormat::F32 => {
                let buffer = buffer.clone();
                let meter = meter.clone();
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _| {
                            push_chunk(&buffer, &meter, data, channels, device_rate, target_rate, |s| s);
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|err| CoachError::Capture(err.to_string()))?
            }
            SampleFormat::I16 => {
                let buffer = buffer.clone();
                let meter = meter.clone();
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _| {
                            push_chunk(&buffer, &meter, data, channels, device_rate, target_rate, |s| {
                                f32::from(s) / 32_768.0
                            });
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|err| CoachError::Capture(err.to_string()))?
            }
            SampleFormat::U16 => {
                let buffer = buffer.clone();
                let meter = meter.clone();
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[u16], _| {
                            push_chunk(&buffer, &meter, data, channels, device_rate, target_rate, |s| {
                                (f32::from(s) - 32_768.0) / 32_768.0
                            });
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|err| CoachError::Capture(err.to_string()))?
            }
            other => {
                return Err(CoachError::Capture(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|err| CoachError::Capture(format!("failed to start stream: {err}")))?;

        Ok(Self {
            stream,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn pause(&self) {
        if let Err(err) = self.stream.pause() {
            debug!("failed to pause capture stream: {err}");
        }
    }
}

/// Downmix interleaved frames to mono, resample, and append as i16 PCM.
fn push_chunk<T: Copy>(
    buffer: &SampleBuffer,
    meter: &LiveMeter,
    data: &[T],
    channels: usize,
    device_rate: u32,
    target_rate: u32,
    convert: impl Fn(T) -> f32,
) {
    if data.is_empty() {
        return;
    }
    let channels = channels.max(1);
    let mut mono = Vec::with_capacity(data.len() / channels);
    for frame in data.chunks(channels) {
        let sum: f32 = frame.iter().map(|&s| convert(s)).sum();
        mono.push(sum / frame.len() as f32);
    }
    meter.set_db(rms_db(&mono));
    let resampled = resample_to_rate(&mono, device_rate, target_rate);
    let pcm: Vec<i16> = resampled
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32_767.0).round() as i16)
        .collect();
    buffer.append(&pcm);
}

#[cfg(test)]
pub(super) fn push_chunk_for_tests(
    buffer: &SampleBuffer,
    meter: &LiveMeter,
    data: &[f32],
    channels: usize,
    device_rate: u32,
    target_rate: u32,
) {
    push_chunk(buffer, meter, data, channels, device_rate, target_rate, |s| s);
}
