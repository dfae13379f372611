//! Transcription via an external `whisper-cli` process.
//!
//! The engine runs out of process: each window is written to a temporary WAV
//! file, the CLI is spawned against it, and its stdout is parsed back into a
//! transcript. Keeping the engine external means a crashed or wedged model
//! can never take the capture pipeline down with it; a deadline kills the
//! child instead.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use std::io::Read;

use tracing::{debug, warn};

use crate::audio::AudioWindow;
use crate::error::CoachError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Anything that can turn an audio window into text.
///
/// The session only sees this trait, so a stub engine can stand in for the
/// real CLI in tests and the pipeline keeps running (audio-only) when no
/// engine is configured.
pub trait Transcribe: Send + Sync {
    fn transcribe(&self, window: &AudioWindow) -> Result<String, CoachError>;
}

/// Where the engine binary and its model live.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub command: PathBuf,
    pub model: PathBuf,
}

impl EngineSpec {
    pub fn new(command: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            model: model.into(),
        }
    }

    /// Check that the pieces exist before the first window arrives.
    ///
    /// A bare command name is left to PATH lookup at spawn time; only an
    /// explicit path is checked here. The model file is always checked.
    pub fn resolve(&self) -> Result<(), CoachError> {
        if self.command.components().count() > 1 && !self.command.exists() {
            return Err(CoachError::EngineUnavailable(format!(
                "engine binary not found: {}",
                self.command.display()
            )));
        }
        if !self.model.exists() {
            return Err(CoachError::EngineUnavailable(format!(
                "model file not found: {}",
                self.model.display()
            )));
        }
        Ok(())
    }
}

/// Subprocess-backed whisper engine.
pub struct WhisperCli {
    spec: EngineSpec,
    timeout: Duration,
}

impl WhisperCli {
    pub fn new(spec: EngineSpec, timeout: Duration) -> Result<Self, CoachError> {
        spec.resolve()?;
        Ok(Self { spec, timeout })
    }

    /// Run the engine once against a short synthetic tone to confirm it
    /// starts and exits cleanly within `budget`. Unlike the live pipeline,
    /// an abnormal exit here is an error: a self-test against an engine
    /// that crashes on every invocation must not report success.
    pub fn probe(&self, budget: Duration) -> Result<(), CoachError> {
        let tone = probe_tone();
        let output = self.run(&tone, budget)?;
        if !output.status.success() {
            return Err(CoachError::EngineUnavailable(format!(
                "engine self-test exited with status {}: {}",
                output.status.code().unwrap_or(-1),
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    fn run(&self, window: &AudioWindow, budget: Duration) -> Result<EngineOutput, CoachError> {
        let wav = write_temp_wav(window)?;
        let started = Instant::now();

        let mut child = Command::new(&self.spec.command)
            .arg("-m")
            .arg(&self.spec.model)
            .arg("-f")
            .arg(wav.path())
            .arg("--no-timestamps")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CoachError::EngineUnavailable(format!(
                    "failed to spawn {}: {e}",
                    self.spec.command.display()
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            CoachError::EngineUnavailable("failed to capture engine stdout".into())
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            CoachError::EngineUnavailable("failed to capture engine stderr".into())
        })?;

        // Drain both pipes on their own threads while polling. A chatty
        // engine build can fill the OS pipe buffer with logs long before it
        // exits; without concurrent drains it would block in write and the
        // poll loop would run out the deadline on a finished transcript.
        let stdout_reader = thread::spawn(move || read_pipe(stdout));
        let stderr_reader = thread::spawn(move || read_pipe(stderr));

        let status = loop {
            if started.elapsed() >= budget {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout_reader.join();
                let _ = stderr_reader.join();
                return Err(CoachError::TimeoutExceeded { budget });
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_reader.join();
                    let _ = stderr_reader.join();
                    return Err(CoachError::Io(e));
                }
            }
        };

        // Child has exited, so both pipes hit EOF and the readers finish.
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            code = status.code().unwrap_or(-1),
            "engine run finished"
        );
        Ok(EngineOutput {
            status,
            stdout,
            stderr,
        })
    }
}

/// One finished engine invocation: exit status plus fully drained pipes.
struct EngineOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

fn read_pipe(mut pipe: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

impl Transcribe for WhisperCli {
    /// An abnormal engine exit degrades the window to an empty transcript;
    /// the pipeline keeps running audio-only rather than dropping windows.
    fn transcribe(&self, window: &AudioWindow) -> Result<String, CoachError> {
        let output = self.run(window, self.timeout)?;
        if !output.status.success() {
            warn!(
                code = output.status.code().unwrap_or(-1),
                stderr = output.stderr.trim(),
                "transcription engine exited abnormally"
            );
            return Ok(String::new());
        }
        Ok(parse_transcript(&output.stdout))
    }
}

/// Engine stand-in for audio-only operation.
pub struct NullTranscriber;

impl Transcribe for NullTranscriber {
    fn transcribe(&self, _window: &AudioWindow) -> Result<String, CoachError> {
        Err(CoachError::EngineUnavailable(
            "no transcription engine configured".into(),
        ))
    }
}

/// Pick the transcript out of the CLI's mixed stdout.
///
/// whisper-cli interleaves its own log lines (prefixed `whisper_` or
/// bracketed timestamps) with the recognized text; the first line that is
/// neither is the transcript.
fn parse_transcript(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty() && !line.starts_with('[') && !line.starts_with("whisper_")
        })
        .unwrap_or("")
        .to_string()
}

fn write_temp_wav(window: &AudioWindow) -> Result<tempfile::NamedTempFile, CoachError> {
    let file = tempfile::Builder::new()
        .prefix("speechcoach-")
        .suffix(".wav")
        .tempfile()?;
    write_wav(file.path(), window)?;
    Ok(file)
}

fn write_wav(path: &Path, window: &AudioWindow) -> Result<(), CoachError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: window.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in window.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn probe_tone() -> AudioWindow {
    let sample_rate = 16_000u32;
    let samples = (0..sample_rate)
        .map(|i| {
            let t = f64::from(i) / f64::from(sample_rate);
            (0.3 * (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 32_767.0) as i16
        })
        .collect();
    AudioWindow::new(samples, sample_rate)
}
