use serde::{Deserialize, Serialize};

/// Audio frame published to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded audio bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Diarized result received from the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct SttResultMessage {
    pub session_id: String,
    /// Speaker label attributed by the diarizer, when available
    #[serde(default)]
    pub speaker: Option<String>,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    pub confidence: f32,
}
