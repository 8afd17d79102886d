pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod session;
pub mod summary;
pub mod transcribe;

pub use config::Config;
pub use error::TranscribeError;
pub use http::{create_router, AppState};
pub use session::{
    ChunkIngestor, EventBatch, EventDispatcher, Reaper, Session, SessionRegistry, SessionState,
    SessionStats,
};
pub use summary::{Summarizer, SummaryResult};
pub use transcribe::{
    BackendFactory, BackendKind, DemoBackend, RawSegment, StreamingBackend, TranscriptEvent,
    TranscriptionBackend,
};
