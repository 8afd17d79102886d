//! Uploaded audio file handling
//!
//! Uploads keep their extension but are stored under collision-free UUID
//! names; only a small allow-list of audio container formats is accepted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ALLOWED_AUDIO_EXTENSIONS: &[&str] = &["mp3", "mp4", "m4a", "wav", "aac", "ogg"];

/// A stored upload, as reported back to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAudio {
    /// Original filename as uploaded
    pub name: String,
    /// URL the file is served back from
    pub url: String,
    pub mimetype: String,
}

/// Lowercased extension of the filename, when it is on the allow-list
pub fn allowed_audio_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_AUDIO_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Collision-free storage name preserving the extension
pub fn storage_name(ext: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), ext)
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
