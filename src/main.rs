use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::fmt::time::UtcTime;

use speechcoach::audio::list_input_devices;
use speechcoach::{
    AnalysisSnapshot, AnalyzerConfig, CoachSession, EngineSpec, NullTranscriber, Transcribe,
    WhisperCli,
};

/// How long the output loop waits for the next snapshot before rechecking
/// the session deadline.
const RECV_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Parser)]
#[command(
    name = "speechcoach",
    version,
    about = "Live speech coaching: scores tone, clarity, volume, and fluency from captured audio"
)]
struct Cli {
    /// Capture source name (exact match). Defaults to monitor-source
    /// autodetection.
    #[arg(long, env = "SPEECHCOACH_DEVICE")]
    device: Option<String>,

    /// List capture sources and exit.
    #[arg(long)]
    list_devices: bool,

    /// Analyzer configuration file (JSON). Missing or invalid fields fall
    /// back to defaults.
    #[arg(long, env = "SPEECHCOACH_CONFIG")]
    config: Option<PathBuf>,

    /// Transcription engine binary.
    #[arg(long, default_value = "whisper-cli", env = "SPEECHCOACH_ENGINE")]
    engine: PathBuf,

    /// Whisper model file. Without one the session runs audio-only.
    #[arg(long, env = "SPEECHCOACH_MODEL")]
    model: Option<PathBuf>,

    /// Run the engine once against a synthetic tone and exit.
    #[arg(long)]
    probe: bool,

    /// Session length in seconds.
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Emit one JSON object per snapshot instead of the human summary.
    #[arg(long)]
    json: bool,

    /// Log debug detail to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_devices {
        for name in list_input_devices().context("failed to enumerate capture sources")? {
            println!("{name}");
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => AnalyzerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    if cli.probe {
        let model = cli
            .model
            .as_ref()
            .context("--probe requires --model")?;
        let engine = WhisperCli::new(
            EngineSpec::new(&cli.engine, model),
            Duration::from_millis(config.transcribe_timeout_ms),
        )?;
        engine.probe(Duration::from_millis(config.probe_timeout_ms))?;
        println!("engine ok: {}", cli.engine.display());
        return Ok(());
    }

    let transcriber: Arc<dyn Transcribe> = match &cli.model {
        Some(model) => Arc::new(WhisperCli::new(
            EngineSpec::new(&cli.engine, model),
            Duration::from_millis(config.transcribe_timeout_ms),
        )?),
        None => {
            warn!("no model given, running audio-only");
            Arc::new(NullTranscriber)
        }
    };

    let mut session = CoachSession::new(config, transcriber);
    let snapshots = session.snapshots();
    session.start(cli.device.as_deref())?;
    if let Some(device) = session.device_name() {
        eprintln!("recording from {device} for {}s", cli.seconds);
    }

    let started = Instant::now();
    let deadline = started + Duration::from_secs(cli.seconds);
    let mut stdout = io::stdout().lock();
    while Instant::now() < deadline {
        match snapshots.recv_timeout(RECV_POLL) {
            Ok(snapshot) => {
                if cli.json {
                    let line = serde_json::to_string(&snapshot)?;
                    writeln!(stdout, "{line}")?;
                } else {
                    print_snapshot(&mut stdout, started.elapsed(), &snapshot)?;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    session.stop()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let max_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(io::stderr)
        .with_max_level(max_level)
        .init();
}

fn print_snapshot(
    out: &mut impl Write,
    elapsed: Duration,
    snapshot: &AnalysisSnapshot,
) -> Result<()> {
    let secs = elapsed.as_secs();
    let scores = &snapshot.scores;
    writeln!(
        out,
        "[{:02}:{:02}] overall {:>3} | tone {:>3} clarity {:>3} volume {:>3} fluency {:>3}",
        secs / 60,
        secs % 60,
        scores.overall,
        scores.tone,
        scores.clarity,
        scores.volume,
        scores.fluency
    )?;
    if !snapshot.transcription.is_empty() {
        writeln!(out, "        \"{}\"", snapshot.transcription)?;
    }
    for alert in &snapshot.alerts {
        writeln!(out, "        ! {alert}")?;
    }
    Ok(())
}
