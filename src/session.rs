//! Live coaching session: capture, slicing, analysis, publishing.
//!
//! The session owns the capture stream (cpal streams are not `Send`, so the
//! stream stays on the thread that started it) and a worker thread that
//! drains the shared buffer. The worker never touches the stream; the two
//! sides meet only at the `SampleBuffer`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::analysis::analyze_window;
use crate::audio::{has_speech, select_input_device, AudioWindow, CaptureStream, LiveMeter, SampleBuffer};
use crate::config::AnalyzerConfig;
use crate::error::CoachError;
use crate::snapshot::{unix_millis, AnalysisSnapshot};
use crate::stt::Transcribe;

/// Wait this long for the worker to drain its current pass before detaching.
const STOP_GRACE: Duration = Duration::from_secs(2);
/// Worker idle sleep while waiting for the buffer to fill.
const IDLE_SLEEP: Duration = Duration::from_millis(10);
/// Capacity of the snapshot channel; a slow consumer loses old snapshots,
/// never blocks the worker.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 8;

pub struct CoachSession {
    config: Arc<RwLock<AnalyzerConfig>>,
    transcriber: Arc<dyn Transcribe>,
    meter: LiveMeter,
    running: Arc<AtomicBool>,
    stream: Option<CaptureStream>,
    worker: Option<JoinHandle<()>>,
    done_rx: Option<Receiver<()>>,
    snapshot_tx: Sender<AnalysisSnapshot>,
    snapshot_rx: Receiver<AnalysisSnapshot>,
    latest: Arc<Mutex<Option<AnalysisSnapshot>>>,
}

impl CoachSession {
    pub fn new(config: AnalyzerConfig, transcriber: Arc<dyn Transcribe>) -> Self {
        let (snapshot_tx, snapshot_rx) = bounded(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(RwLock::new(config.sanitized())),
            transcriber,
            meter: LiveMeter::new(),
            running: Arc::new(AtomicBool::new(false)),
            stream: None,
            worker: None,
            done_rx: None,
            snapshot_tx,
            snapshot_rx,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the capture device and start analyzing. A fresh buffer is created
    /// per session so no stale audio from a previous run leaks in.
    pub fn start(&mut self, preferred_device: Option<&str>) -> Result<(), CoachError> {
        if self.stream.is_some() {
            warn!("start ignored: session already recording");
            return Ok(());
        }

        let cfg = self.config_snapshot();
        let device = select_input_device(preferred_device)?;
        let buffer = Arc::new(SampleBuffer::new(cfg.sample_rate));
        self.meter.reset();

        let stream = CaptureStream::open(&device, buffer.clone(), self.meter.clone(), cfg.sample_rate)?;
        info!(device = stream.device_name(), "recording started");

        self.running.store(true, Ordering::Release);
        let (done_tx, done_rx) = bounded(1);
        let worker = {
            let buffer = buffer.clone();
            let config = self.config.clone();
            let transcriber = self.transcriber.clone();
            let running = self.running.clone();
            let snapshot_tx = self.snapshot_tx.clone();
            let latest = self.latest.clone();
            thread::Builder::new()
                .name("coach-analysis".into())
                .spawn(move || {
                    run_worker(&buffer, &config, transcriber.as_ref(), &running, &snapshot_tx, &latest);
                    let _ = done_tx.send(());
                })
                .map_err(CoachError::Io)?
        };

        self.stream = Some(stream);
        self.worker = Some(worker);
        self.done_rx = Some(done_rx);
        Ok(())
    }

    /// Stop capture and wait briefly for the worker to finish its pass. If an
    /// in-flight transcription overruns the grace period the worker thread is
    /// detached rather than blocked on.
    pub fn stop(&mut self) -> Result<(), CoachError> {
        if self.stream.is_none() && self.worker.is_none() {
            return Ok(());
        }
        self.running.store(false, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            stream.pause();
        }

        let done_rx = self.done_rx.take();
        if let Some(worker) = self.worker.take() {
            let finished = done_rx
                .map(|rx| rx.recv_timeout(STOP_GRACE).is_ok())
                .unwrap_or(false);
            if finished {
                let _ = worker.join();
                info!("recording stopped");
            } else {
                warn!("analysis worker still busy after stop grace period, detaching");
            }
        }
        Ok(())
    }

    /// Swap the configuration. Takes effect on the next analysis pass.
    pub fn update_config(&self, config: AnalyzerConfig) {
        let sanitized = config.sanitized();
        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        *guard = sanitized;
        debug!("analyzer configuration updated");
    }

    pub fn config_snapshot(&self) -> AnalyzerConfig {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Most recent snapshot, if any window has completed analysis.
    pub fn latest(&self) -> Option<AnalysisSnapshot> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Live stream of snapshots. The channel is bounded; when the consumer
    /// lags, newer snapshots are dropped and `latest` remains authoritative.
    pub fn snapshots(&self) -> Receiver<AnalysisSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Instantaneous input level in dBFS, for a UI meter.
    pub fn input_level_db(&self) -> f32 {
        self.meter.level_db()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.stream.as_ref().map(CaptureStream::device_name)
    }
}

impl Drop for CoachSession {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run_worker(
    buffer: &SampleBuffer,
    config: &RwLock<AnalyzerConfig>,
    transcriber: &dyn Transcribe,
    running: &AtomicBool,
    snapshot_tx: &Sender<AnalysisSnapshot>,
    latest: &Mutex<Option<AnalysisSnapshot>>,
) {
    let mut last_publish: Option<Instant> = None;
    while running.load(Ordering::Acquire) {
        // Per-pass config snapshot so a live update never tears a window.
        let cfg = config.read().unwrap_or_else(|e| e.into_inner()).clone();
        let Some(window) = buffer.try_slice_window(cfg.window_samples(), cfg.step_samples()) else {
            thread::sleep(IDLE_SLEEP);
            continue;
        };

        // Rate limit: windows sliced faster than the publish interval are
        // dropped, not queued, so output pressure stays bounded.
        let interval = Duration::from_millis(cfg.publish_interval_ms);
        let now = Instant::now();
        if last_publish.is_some_and(|prev| now.duration_since(prev) < interval) {
            debug!("window dropped by publish rate limit");
            continue;
        }
        last_publish = Some(now);

        let snapshot = process_window(&window, transcriber, &cfg);
        publish(snapshot, snapshot_tx, latest);
    }
}

/// Analyze one window end to end. Windows below the speech threshold publish
/// a zero snapshot without invoking the transcription engine; a failed
/// transcription degrades to audio-only metrics instead of dropping the
/// window.
pub fn process_window(
    window: &AudioWindow,
    transcriber: &dyn Transcribe,
    cfg: &AnalyzerConfig,
) -> AnalysisSnapshot {
    if !has_speech(window, cfg.speech_rms_threshold) {
        return AnalysisSnapshot::silent(window.duration_secs());
    }

    let transcription = match transcriber.transcribe(window) {
        Ok(text) => text,
        Err(err) => {
            warn!("transcription failed, continuing audio-only: {err}");
            String::new()
        }
    };

    let (metrics, scores, alerts) = analyze_window(window, &transcription, cfg);
    AnalysisSnapshot {
        timestamp_ms: unix_millis(),
        duration_secs: window.duration_secs(),
        transcription,
        metrics,
        scores,
        alerts,
    }
}

fn publish(
    snapshot: AnalysisSnapshot,
    snapshot_tx: &Sender<AnalysisSnapshot>,
    latest: &Mutex<Option<AnalysisSnapshot>>,
) {
    {
        let mut guard = latest.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(snapshot.clone());
    }
    match snapshot_tx.try_send(snapshot) {
        Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
    }
}
