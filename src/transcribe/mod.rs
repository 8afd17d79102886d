//! Transcription backends
//!
//! A session owns exactly one `TranscriptionBackend`, picked at start:
//! - `StreamingBackend`: forwards audio to the external diarization/STT
//!   service over NATS and converts its partial/final results into segments
//! - `DemoBackend`: synthesizes deterministic diarized segments when no
//!   STT endpoint is configured
//!
//! The choice is fixed for the session's lifetime.

mod backend;
mod demo;
mod event;
mod messages;
mod streaming;

pub use backend::{BackendFactory, BackendKind, TranscriptionBackend};
pub use demo::DemoBackend;
pub use event::{RawSegment, TranscriptEvent};
pub use messages::{AudioFrameMessage, SttResultMessage};
pub use streaming::StreamingBackend;
