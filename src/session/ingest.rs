use super::registry::SessionRegistry;
use crate::error::TranscribeError;
use std::sync::Arc;
use tracing::error;

/// Validates raw audio chunks and forwards them to session backends
///
/// Forwarding is append-only per session in arrival order; chunks are never
/// reordered or buffered across calls.
pub struct ChunkIngestor {
    registry: Arc<SessionRegistry>,
    max_chunk_bytes: usize,
}

impl ChunkIngestor {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        let max_chunk_bytes = registry.config().max_chunk_bytes;
        Self {
            registry,
            max_chunk_bytes,
        }
    }

    /// Accept one chunk for a session
    ///
    /// Oversized chunks are rejected before the session is touched, so its
    /// stats stay unchanged. A backend failure mid-stream is fatal to that
    /// session alone: it is torn down through the shared idempotent path and
    /// other sessions keep processing.
    pub async fn ingest(&self, session_id: &str, chunk: &[u8]) -> Result<(), TranscribeError> {
        if chunk.len() > self.max_chunk_bytes {
            return Err(TranscribeError::ChunkTooLarge {
                size: chunk.len(),
                limit: self.max_chunk_bytes,
            });
        }

        let session = self.registry.get(session_id).await?;

        match session.push_chunk(chunk).await {
            Err(e @ TranscribeError::BackendUnavailable(_)) => {
                error!("Backend failed mid-stream for session {}: {}", session_id, e);
                self.registry.end(session_id).await;
                Err(e)
            }
            other => other,
        }
    }
}
