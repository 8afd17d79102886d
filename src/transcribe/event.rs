use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single diarized transcript event in a session's event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Strictly increasing per-session sequence number, assigned by the
    /// session at emission time and never reused
    pub sequence: u64,

    /// Speaker label, stable within the session but not globally meaningful
    pub speaker: String,

    /// Recognized text
    pub text: String,

    /// Finalized segment vs. a provisional hypothesis that a later event
    /// may supersede
    pub is_final: bool,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,

    /// Wall-clock time of emission
    pub timestamp: DateTime<Utc>,
}

/// A diarized segment as produced by a backend, before the owning session
/// assigns it a sequence number and timestamp
#[derive(Debug, Clone)]
pub struct RawSegment {
    pub speaker: String,
    pub text: String,
    pub is_final: bool,
    pub confidence: f32,
}
