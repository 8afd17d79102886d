use thiserror::Error;

/// Errors surfaced by the transcription session subsystem
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("session {0} is no longer accepting audio")]
    SessionNotActive(String),

    #[error("audio chunk of {size} bytes exceeds the {limit} byte limit")]
    ChunkTooLarge { size: usize, limit: usize },

    #[error("transcription backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl TranscribeError {
    /// Returns true if the client can recover by retrying against a fresh session
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TranscribeError::BackendUnavailable(_))
    }
}
