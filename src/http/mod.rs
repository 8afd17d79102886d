//! HTTP API for the clinical visit recorder
//!
//! Live transcription:
//! - POST /transcribe/start - Start a session, reports the backend variant
//! - POST /transcribe/stream/:id - Push one audio chunk
//! - GET /transcribe/poll/:id - Resumable event poll (long-poll by default)
//! - GET /transcribe/events/:id - Server-sent event stream
//! - GET /transcribe/status/:id - Session statistics
//! - POST /transcribe/end/:id - End a session (idempotent)
//!
//! Documents and media:
//! - POST /summarize - PDF records → health summary
//! - POST /upload-audio - Store audio files for playback
//! - GET /media/audio/* - Serve stored audio
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
