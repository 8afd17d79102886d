use super::stats::SessionStats;
use crate::error::TranscribeError;
use crate::transcribe::{BackendKind, TranscriptEvent, TranscriptionBackend};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Lifecycle state of a transcription session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Accepting audio; the backend may produce events
    Active,
    /// Draining in-flight results; audio is rejected
    Ending,
    /// Terminal; backend released
    Ended,
}

/// One live transcription interaction
///
/// Owns exactly one backend instance for its whole lifetime, an append-only
/// event log with strictly increasing contiguous sequence numbers, and the
/// lifecycle state. All mutation goes through this session's own locks; the
/// registry map never protects per-session state.
pub struct Session {
    id: String,

    /// Backend variant picked at start, fixed for the session's lifetime
    backend_kind: BackendKind,

    started_at: DateTime<Utc>,

    state: Arc<Mutex<SessionState>>,

    /// Exclusively owned backend, released exactly once on teardown
    backend: Arc<Mutex<Box<dyn TranscriptionBackend>>>,

    /// Ordered transcript events, append-only while active
    events: Arc<Mutex<Vec<TranscriptEvent>>>,

    /// Highest sequence number assigned so far
    next_sequence: Arc<AtomicU64>,

    /// Wakes suspended event polls when the log grows or the session ends
    event_notify: Arc<Notify>,

    /// Microseconds since epoch of the last chunk or event, strictly increasing
    last_activity_micros: Arc<AtomicI64>,

    chunks_received: Arc<AtomicUsize>,
    bytes_received: Arc<AtomicUsize>,

    /// Handle for the backend event consumer task
    event_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Session {
    /// Start a session on the given backend
    ///
    /// Opens the backend's result stream and spawns the consumer task that
    /// assigns sequence numbers and appends to the event log.
    pub async fn start(
        id: String,
        mut backend: Box<dyn TranscriptionBackend>,
    ) -> Result<Self, TranscribeError> {
        info!("Starting transcription session: {}", id);

        let backend_kind = backend.kind();
        let mut segment_rx = backend.start().await?;

        let session = Self {
            id: id.clone(),
            backend_kind,
            started_at: Utc::now(),
            state: Arc::new(Mutex::new(SessionState::Active)),
            backend: Arc::new(Mutex::new(backend)),
            events: Arc::new(Mutex::new(Vec::new())),
            next_sequence: Arc::new(AtomicU64::new(0)),
            event_notify: Arc::new(Notify::new()),
            last_activity_micros: Arc::new(AtomicI64::new(Utc::now().timestamp_micros())),
            chunks_received: Arc::new(AtomicUsize::new(0)),
            bytes_received: Arc::new(AtomicUsize::new(0)),
            event_task: Arc::new(Mutex::new(None)),
        };

        // Consumer task: the only writer of the event log
        let events = Arc::clone(&session.events);
        let next_sequence = Arc::clone(&session.next_sequence);
        let event_notify = Arc::clone(&session.event_notify);
        let last_activity = Arc::clone(&session.last_activity_micros);

        let task = tokio::spawn(async move {
            info!("Event task started for session {}", id);

            while let Some(segment) = segment_rx.recv().await {
                let sequence = next_sequence.fetch_add(1, Ordering::SeqCst) + 1;

                let event = TranscriptEvent {
                    sequence,
                    speaker: segment.speaker,
                    text: segment.text,
                    is_final: segment.is_final,
                    confidence: segment.confidence,
                    timestamp: Utc::now(),
                };

                {
                    let mut log = events.lock().await;
                    log.push(event);
                }

                touch(&last_activity);
                event_notify.notify_waiters();
            }

            info!("Event task stopped for session {}", id);
        });

        {
            let mut handle = session.event_task.lock().await;
            *handle = Some(task);
        }

        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Forward one audio chunk to the backend
    ///
    /// Chunks against a session that is ending or ended are rejected and
    /// dropped, never buffered. Stats and activity are only updated after
    /// the backend accepted the chunk.
    pub async fn push_chunk(&self, chunk: &[u8]) -> Result<(), TranscribeError> {
        {
            let state = self.state.lock().await;
            if *state != SessionState::Active {
                return Err(TranscribeError::SessionNotActive(self.id.clone()));
            }
        }

        {
            let mut backend = self.backend.lock().await;
            backend.push_audio(chunk).await?;
        }

        self.chunks_received.fetch_add(1, Ordering::SeqCst);
        self.bytes_received.fetch_add(chunk.len(), Ordering::SeqCst);
        touch(&self.last_activity_micros);

        Ok(())
    }

    /// Events with `sequence > after_seq`, in order
    ///
    /// The log is contiguous from sequence 1, so the cursor doubles as an
    /// index into it.
    pub async fn events_after(&self, after_seq: u64) -> Vec<TranscriptEvent> {
        let log = self.events.lock().await;
        let start = (after_seq as usize).min(log.len());
        log[start..].to_vec()
    }

    /// Full event log accumulated so far
    pub async fn transcript(&self) -> Vec<TranscriptEvent> {
        let log = self.events.lock().await;
        log.clone()
    }

    /// Future that resolves when the log grows or the session ends.
    ///
    /// Call `enable` on the pinned future before re-reading the log so a
    /// notification between the read and the await is not lost.
    pub fn notified(&self) -> Notified<'_> {
        self.event_notify.notified()
    }

    /// Time since the last chunk or event
    pub fn idle_for(&self) -> Duration {
        let last = self.last_activity_micros.load(Ordering::SeqCst);
        let now = Utc::now().timestamp_micros();
        Duration::from_micros(now.saturating_sub(last).max(0) as u64)
    }

    pub fn last_activity_micros(&self) -> i64 {
        self.last_activity_micros.load(Ordering::SeqCst)
    }

    /// Tear the session down: drain, release the backend, stop the event task
    ///
    /// Explicit end and reaper eviction both land here; the first caller
    /// performs the teardown and later callers return immediately, so the
    /// backend is released exactly once.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock().await;
            if *state != SessionState::Active {
                return;
            }
            *state = SessionState::Ending;
        }

        info!("Ending transcription session: {}", self.id);

        {
            let mut backend = self.backend.lock().await;

            // Best-effort drain; a backend failure here ends the session
            // early rather than propagating
            if let Err(e) = backend.finish().await {
                error!("Drain failed for session {}: {}", self.id, e);
            }

            if let Err(e) = backend.close().await {
                error!("Backend close failed for session {}: {}", self.id, e);
            }
        }

        // The segment channel is closed now; wait for the consumer to drain it
        {
            let mut handle = self.event_task.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Event task panicked for session {}: {}", self.id, e);
                }
            }
        }

        {
            let mut state = self.state.lock().await;
            *state = SessionState::Ended;
        }

        // Wake suspended polls so they observe the final log
        self.event_notify.notify_waiters();

        info!("Transcription session ended: {}", self.id);
    }

    /// Current session statistics
    pub async fn stats(&self) -> SessionStats {
        let log = self.events.lock().await;

        let mut word_count = 0;
        let mut speaker_segments: HashMap<String, usize> = HashMap::new();
        for event in log.iter().filter(|e| e.is_final) {
            word_count += event.text.split_whitespace().count();
            *speaker_segments.entry(event.speaker.clone()).or_default() += 1;
        }

        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            state: *self.state.lock().await,
            backend: self.backend_kind,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_received: self.chunks_received.load(Ordering::SeqCst),
            bytes_received: self.bytes_received.load(Ordering::SeqCst),
            event_count: log.len(),
            word_count,
            speaker_segments,
        }
    }
}

/// Bump the activity clock, strictly increasing even when the wall clock
/// ticks coarser than the call rate
fn touch(last_activity: &AtomicI64) {
    let now = Utc::now().timestamp_micros();
    let _ = last_activity.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
        Some(now.max(prev + 1))
    });
}
