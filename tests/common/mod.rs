// Shared test fixtures: an instrumented mock transcription backend and
// config helpers for fast-running sessions.

use async_trait::async_trait;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex};
use visit_scribe::config::TranscribeConfig;
use visit_scribe::{BackendKind, RawSegment, TranscribeError, TranscriptionBackend};

/// Observable state of a `MockBackend`, shared with the test body
pub struct MockState {
    /// Chunks in the order the backend received them
    pub chunks: StdMutex<Vec<Vec<u8>>>,
    pub finish_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    segment_tx: Mutex<Option<mpsc::Sender<RawSegment>>>,
}

impl MockState {
    /// Feed a segment into the owning session, as a live backend would
    pub async fn emit(&self, speaker: &str, text: &str, is_final: bool) {
        let tx = self.segment_tx.lock().await;
        let tx = tx.as_ref().expect("backend not started");
        tx.send(RawSegment {
            speaker: speaker.to_string(),
            text: text.to_string(),
            is_final,
            confidence: 0.9,
        })
        .await
        .expect("session event task gone");
    }
}

/// Scriptable backend that records every interaction
pub struct MockBackend {
    state: Arc<MockState>,
    /// When set, push_audio fails as if the service connection dropped
    pub fail_pushes: bool,
}

impl MockBackend {
    pub fn new() -> (Self, Arc<MockState>) {
        let state = Arc::new(MockState {
            chunks: StdMutex::new(Vec::new()),
            finish_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            segment_tx: Mutex::new(None),
        });

        (
            Self {
                state: Arc::clone(&state),
                fail_pushes: false,
            },
            state,
        )
    }
}

#[async_trait]
impl TranscriptionBackend for MockBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RawSegment>, TranscribeError> {
        let (tx, rx) = mpsc::channel(64);
        *self.state.segment_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn push_audio(&mut self, chunk: &[u8]) -> Result<(), TranscribeError> {
        if self.fail_pushes {
            return Err(TranscribeError::BackendUnavailable(
                "mock connection dropped".to_string(),
            ));
        }
        self.state.chunks.lock().unwrap().push(chunk.to_vec());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TranscribeError> {
        self.state
            .finish_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.state.segment_tx.lock().await.take();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TranscribeError> {
        self.state
            .close_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.state.segment_tx.lock().await.take();
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Demo
    }
}

/// Transcription config tuned so tests never wait on production timeouts
pub fn test_config() -> TranscribeConfig {
    TranscribeConfig {
        nats_url: None,
        max_chunk_bytes: 256 * 1024,
        session_timeout_secs: 60,
        reaper_interval_secs: 1,
        poll_timeout_secs: 1,
        ..TranscribeConfig::default()
    }
}

/// Bytes of audio that make the demo backend emit exactly one
/// partial + final pair (2 seconds at 16kHz mono 16-bit)
pub const DEMO_SEGMENT_BYTES: usize = 16000 * 2 * 2;
