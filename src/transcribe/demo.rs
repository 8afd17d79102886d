use super::backend::{BackendKind, TranscriptionBackend};
use super::event::RawSegment;
use crate::config::TranscribeConfig;
use crate::error::TranscribeError;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Scripted clinical exchange the demo backend cycles through
const DEMO_PHRASES: &[&str] = &[
    "Hello, how are you today?",
    "I'm doing well, thank you for asking.",
    "What brings you here today?",
    "I have an appointment scheduled.",
    "Let me check your records.",
    "Everything looks good so far.",
    "Do you have any questions?",
    "The patient reports feeling better.",
    "We should schedule a follow-up appointment.",
    "The medication seems to be working well.",
    "Please take this prescription to the pharmacy.",
    "Thank you for your time.",
];

const DEMO_SPEAKERS: &[&str] = &["Speaker_1", "Speaker_2", "Speaker_3"];

/// Seconds of received audio per synthesized segment
const SEGMENT_SECS: usize = 2;

const SEGMENT_CHANNEL_CAPACITY: usize = 64;

/// Synthesizes plausible diarized transcript events at a fixed cadence.
///
/// Selected when no STT endpoint is configured; a first-class backend, not an
/// error path. For every ~2 seconds of received audio it emits one partial
/// hypothesis followed by its finalized segment, rotating a fixed phrase list
/// and speaker set with deterministic confidences, so the rest of the
/// pipeline and the UI behave reproducibly.
pub struct DemoBackend {
    /// Bytes of audio that map to one synthesized segment
    bytes_per_segment: usize,

    /// Audio bytes accumulated toward the next segment
    pending_bytes: usize,

    /// Position in the scripted exchange
    segment_index: usize,

    tx: Option<mpsc::Sender<RawSegment>>,
}

impl DemoBackend {
    pub fn new(config: &TranscribeConfig) -> Self {
        // 16-bit PCM at the configured rate
        let bytes_per_second = config.sample_rate as usize * config.channels as usize * 2;

        Self {
            bytes_per_segment: bytes_per_second * SEGMENT_SECS,
            pending_bytes: 0,
            segment_index: 0,
            tx: None,
        }
    }

    fn phrase(index: usize) -> &'static str {
        DEMO_PHRASES[index % DEMO_PHRASES.len()]
    }

    fn speaker(index: usize) -> &'static str {
        DEMO_SPEAKERS[index % DEMO_SPEAKERS.len()]
    }

    /// Deterministic confidence in the band a real service reports
    fn confidence(index: usize) -> f32 {
        0.85 + ((index * 7) % 14) as f32 / 100.0
    }

    /// First half of a phrase, as an interim hypothesis
    fn partial_text(phrase: &str) -> String {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        words[..words.len().div_ceil(2)].join(" ")
    }

    async fn emit_segment(&mut self) {
        let index = self.segment_index;
        self.segment_index += 1;

        let phrase = Self::phrase(index);
        let speaker = Self::speaker(index).to_string();
        let confidence = Self::confidence(index);

        let partial = RawSegment {
            speaker: speaker.clone(),
            text: Self::partial_text(phrase),
            is_final: false,
            confidence: (confidence - 0.05).max(0.0),
        };
        let finalized = RawSegment {
            speaker,
            text: phrase.to_string(),
            is_final: true,
            confidence,
        };

        self.send(partial).await;
        self.send(finalized).await;
    }

    async fn send(&self, segment: RawSegment) {
        if let Some(tx) = &self.tx {
            // The receiver only disappears during teardown; dropping the
            // segment then is harmless.
            if tx.send(segment).await.is_err() {
                debug!("demo segment dropped: session is shutting down");
            }
        }
    }
}

#[async_trait::async_trait]
impl TranscriptionBackend for DemoBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RawSegment>, TranscribeError> {
        let (tx, rx) = mpsc::channel(SEGMENT_CHANNEL_CAPACITY);
        self.tx = Some(tx);
        info!("demo transcription backend started");
        Ok(rx)
    }

    async fn push_audio(&mut self, chunk: &[u8]) -> Result<(), TranscribeError> {
        self.pending_bytes += chunk.len();

        while self.pending_bytes >= self.bytes_per_segment {
            self.pending_bytes -= self.bytes_per_segment;
            self.emit_segment().await;
        }

        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TranscribeError> {
        // Drain: finalize whatever audio is still pending, then close the
        // segment channel.
        if self.pending_bytes > 0 {
            self.pending_bytes = 0;
            self.emit_segment().await;
        }
        self.tx.take();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TranscribeError> {
        self.tx.take();
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Demo
    }
}
