//! Live transcription session management
//!
//! This module provides the session subsystem:
//! - `Session`: lifecycle state machine, owned backend, ordered event log
//! - `SessionRegistry`: process-wide id → session map
//! - `ChunkIngestor`: validated audio ingestion
//! - `EventDispatcher`: resumable, cursor-based event delivery
//! - `Reaper`: eviction of abandoned sessions

mod dispatch;
mod ingest;
mod reaper;
mod registry;
mod session;
mod stats;

pub use dispatch::{EventBatch, EventDispatcher};
pub use ingest::ChunkIngestor;
pub use reaper::Reaper;
pub use registry::SessionRegistry;
pub use session::{Session, SessionState};
pub use stats::SessionStats;
