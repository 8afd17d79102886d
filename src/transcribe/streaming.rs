use super::backend::{BackendKind, TranscriptionBackend};
use super::event::RawSegment;
use super::messages::{AudioFrameMessage, SttResultMessage};
use crate::config::TranscribeConfig;
use crate::error::TranscribeError;
use base64::Engine;
use futures::stream::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Subject the STT service publishes partial and final results on
const RESULT_SUBJECT: &str = "stt.text.>";

/// Window finish() leaves open for trailing results after the final frame
const DRAIN_WAIT_MS: u64 = 750;

const SEGMENT_CHANNEL_CAPACITY: usize = 64;

/// Streams audio to the external diarization/STT service over NATS.
///
/// Chunks are published base64-encoded as JSON frames on a per-session
/// subject; partial and final results come back on `stt.text.>` and are
/// filtered by session id before being handed to the owning session.
pub struct StreamingBackend {
    client: async_nats::Client,
    session_id: String,
    sample_rate: u32,
    channels: u16,
    sequence: u32,
    result_task: Option<JoinHandle<()>>,
}

impl StreamingBackend {
    /// Connect to the STT service
    ///
    /// A failure here means the session cannot start on the real backend;
    /// it is reported, never silently replaced with the demo variant.
    pub async fn connect(
        url: &str,
        session_id: &str,
        config: &TranscribeConfig,
    ) -> Result<Self, TranscribeError> {
        info!("Connecting to STT service at {}", url);

        let client = async_nats::connect(url).await.map_err(|e| {
            TranscribeError::BackendUnavailable(format!("connect to {} failed: {}", url, e))
        })?;

        info!("Connected to STT service");

        Ok(Self {
            client,
            session_id: session_id.to_string(),
            sample_rate: config.sample_rate,
            channels: config.channels,
            sequence: 0,
            result_task: None,
        })
    }

    fn audio_subject(&self) -> String {
        format!("audio.frame.{}", self.session_id)
    }

    async fn publish_frame(&mut self, audio: &[u8], final_frame: bool) -> Result<(), TranscribeError> {
        let message = AudioFrameMessage {
            session_id: self.session_id.clone(),
            sequence: self.sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(audio),
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame,
        };

        let payload = serde_json::to_vec(&message)
            .map_err(|e| TranscribeError::BackendUnavailable(format!("encode frame: {}", e)))?;

        self.client
            .publish(self.audio_subject(), payload.into())
            .await
            .map_err(|e| {
                TranscribeError::BackendUnavailable(format!("publish audio frame: {}", e))
            })?;

        self.sequence += 1;

        Ok(())
    }
}

#[async_trait::async_trait]
impl TranscriptionBackend for StreamingBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RawSegment>, TranscribeError> {
        let mut subscriber = self.client.subscribe(RESULT_SUBJECT).await.map_err(|e| {
            TranscribeError::BackendUnavailable(format!("subscribe {}: {}", RESULT_SUBJECT, e))
        })?;

        let (tx, rx) = mpsc::channel(SEGMENT_CHANNEL_CAPACITY);
        let session_id = self.session_id.clone();

        let task = tokio::spawn(async move {
            info!("STT result task started for session {}", session_id);

            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<SttResultMessage>(&msg.payload) {
                    Ok(result) => {
                        // Results for every session arrive on the shared subject
                        if result.session_id != session_id {
                            continue;
                        }

                        let segment = RawSegment {
                            speaker: result.speaker.unwrap_or_else(|| "Unknown".to_string()),
                            text: result.text,
                            is_final: !result.partial,
                            confidence: result.confidence.clamp(0.0, 1.0),
                        };

                        if tx.send(segment).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse STT result message: {}", e);
                    }
                }
            }

            info!("STT result task stopped for session {}", session_id);
        });

        self.result_task = Some(task);

        Ok(rx)
    }

    async fn push_audio(&mut self, chunk: &[u8]) -> Result<(), TranscribeError> {
        self.publish_frame(chunk, false).await
    }

    async fn finish(&mut self) -> Result<(), TranscribeError> {
        // Signal end-of-audio, then leave a bounded window for results
        // still in flight before closing the segment channel.
        self.publish_frame(&[], true).await?;

        tokio::time::sleep(Duration::from_millis(DRAIN_WAIT_MS)).await;

        if let Some(task) = self.result_task.take() {
            task.abort();
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), TranscribeError> {
        if let Some(task) = self.result_task.take() {
            task.abort();
        }

        // async-nats tears the connection down on drop
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Streaming
    }
}
