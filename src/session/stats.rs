use super::session::SessionState;
use crate::transcribe::BackendKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Running counters for a transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// Which backend variant the session runs on
    pub backend: BackendKind,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Number of audio chunks accepted so far
    pub chunks_received: usize,

    /// Total audio bytes accepted so far
    pub bytes_received: usize,

    /// Number of transcript events emitted (partials included)
    pub event_count: usize,

    /// Words across finalized segments
    pub word_count: usize,

    /// Finalized segment count per speaker label
    pub speaker_segments: HashMap<String, usize>,
}
