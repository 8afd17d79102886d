use super::registry::SessionRegistry;
use super::session::SessionState;
use crate::error::TranscribeError;
use crate::transcribe::TranscriptEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One poll's worth of ordered transcript events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBatch {
    pub session_id: String,
    pub events: Vec<TranscriptEvent>,
    /// Cursor for the next poll; resuming from it never re-delivers or skips
    pub last_seq: u64,
}

/// Resumable delivery of session events to client pulls
///
/// Every event, partial or final, carries its own sequence number and is
/// delivered at most once per cursor; merging superseded partials is the
/// consumer's concern.
pub struct EventDispatcher {
    registry: Arc<SessionRegistry>,
    poll_timeout: Duration,
}

impl EventDispatcher {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        let poll_timeout = registry.config().poll_timeout();
        Self {
            registry,
            poll_timeout,
        }
    }

    /// Ordered events with `sequence > after_seq`
    ///
    /// With `wait` set and nothing buffered, suspends this caller (only)
    /// until an event arrives, the session ends, or the idle timeout
    /// elapses, then returns an empty batch rather than blocking the
    /// connection indefinitely. An unknown or evicted session fails with
    /// `SessionNotFound`; a poll racing the reaper sees either a clean
    /// batch or that error, never a partial read.
    pub async fn poll(
        &self,
        session_id: &str,
        after_seq: u64,
        wait: bool,
    ) -> Result<EventBatch, TranscribeError> {
        let session = self.registry.get(session_id).await?;
        let deadline = Instant::now() + self.poll_timeout;

        loop {
            // Arm the wakeup before reading the log so an event landing
            // between the read and the await is not missed
            let notified = session.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let events = session.events_after(after_seq).await;

            if !events.is_empty() || !wait || session.state().await == SessionState::Ended {
                let last_seq = events.last().map(|e| e.sequence).unwrap_or(after_seq);
                return Ok(EventBatch {
                    session_id: session_id.to_string(),
                    events,
                    last_seq,
                });
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                // Idle timeout: empty batch, cursor unchanged
                return Ok(EventBatch {
                    session_id: session_id.to_string(),
                    events: Vec::new(),
                    last_seq: after_seq,
                });
            }
        }
    }
}
