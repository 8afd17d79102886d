use super::demo::DemoBackend;
use super::event::RawSegment;
use super::streaming::StreamingBackend;
use crate::config::TranscribeConfig;
use crate::error::TranscribeError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Which backend variant a session runs on, reported to clients at start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// External diarization/STT service over NATS
    Streaming,
    /// Deterministic synthesizer, selected when no STT endpoint is configured
    Demo,
}

/// Transcription backend trait
///
/// One instance is exclusively owned per session. Lifecycle:
/// `start` once, `push_audio` per chunk while the session is active,
/// `finish` to drain in-flight partials, `close` to release resources.
#[async_trait::async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Open the result stream
    ///
    /// Returns a channel receiver that will receive diarized segments.
    /// Called exactly once, before any audio is pushed.
    async fn start(&mut self) -> Result<mpsc::Receiver<RawSegment>, TranscribeError>;

    /// Forward one chunk of audio, in arrival order
    async fn push_audio(&mut self, chunk: &[u8]) -> Result<(), TranscribeError>;

    /// Flush in-flight partial results into finals and close the segment
    /// channel once drained
    async fn finish(&mut self) -> Result<(), TranscribeError>;

    /// Release backend resources. Safe to call more than once.
    async fn close(&mut self) -> Result<(), TranscribeError>;

    /// Variant tag for this backend
    fn kind(&self) -> BackendKind;
}

/// Transcription backend factory
pub struct BackendFactory;

impl BackendFactory {
    /// Pick the backend for a new session
    ///
    /// A configured STT endpoint selects the streaming backend; a connect
    /// failure at this point surfaces `BackendUnavailable` rather than
    /// silently downgrading to demo mode.
    pub async fn create(
        config: &TranscribeConfig,
        session_id: &str,
    ) -> Result<Box<dyn TranscriptionBackend>, TranscribeError> {
        match &config.nats_url {
            Some(url) => {
                let backend = StreamingBackend::connect(url, session_id, config).await?;
                Ok(Box::new(backend))
            }
            None => Ok(Box::new(DemoBackend::new(config))),
        }
    }
}
