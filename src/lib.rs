pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod stt;

pub use config::AnalyzerConfig;
pub use error::CoachError;
pub use session::CoachSession;
pub use snapshot::{AnalysisSnapshot, Scores};
pub use stt::{EngineSpec, NullTranscriber, Transcribe, WhisperCli};
