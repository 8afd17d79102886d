use super::state::AppState;
use crate::error::TranscribeError;
use crate::media::{self, SavedAudio};
use crate::session::SessionStats;
use crate::transcribe::{BackendKind, TranscriptEvent};
use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    /// Which backend variant the session runs on ("streaming" or "demo")
    pub backend: BackendKind,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StreamAudioResponse {
    pub session_id: String,
    pub status: String,
    pub bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub status: String,
    /// Present when the session still existed at the time of the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SessionStats>,
    pub transcript: Vec<TranscriptEvent>,
}

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    #[serde(default)]
    pub after_seq: u64,

    /// Suspend until events arrive or the idle timeout elapses
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_wait() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub after_seq: u64,
}

#[derive(Debug, Serialize)]
pub struct UploadAudioResponse {
    pub files: Vec<SavedAudio>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for TranscribeError {
    fn into_response(self) -> Response {
        let status = match &self {
            TranscribeError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            TranscribeError::SessionNotActive(_) => StatusCode::CONFLICT,
            TranscribeError::ChunkTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            TranscribeError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Live transcription handlers
// ============================================================================

/// POST /transcribe/start
/// Start a new transcription session
pub async fn start_session(State(state): State<AppState>) -> Response {
    match state.registry.create().await {
        Ok(session) => {
            info!(
                "Session {} started on {:?} backend",
                session.id(),
                session.backend_kind()
            );

            (
                StatusCode::OK,
                Json(StartSessionResponse {
                    session_id: session.id().to_string(),
                    backend: session.backend_kind(),
                    status: "started".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// POST /transcribe/stream/:session_id
/// Push one chunk of audio into a session
pub async fn stream_audio(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No audio data provided".to_string(),
            }),
        )
            .into_response();
    }

    match state.ingestor.ingest(&session_id, &body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StreamAudioResponse {
                session_id,
                status: "accepted".to_string(),
                bytes: body.len(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /transcribe/poll/:session_id?after_seq=N
/// Resumable event poll; long-polls by default
pub async fn poll_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<PollQuery>,
) -> Response {
    match state
        .dispatcher
        .poll(&session_id, query.after_seq, query.wait)
        .await
    {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /transcribe/events/:session_id?after_seq=N
/// Server-sent event stream over the same resumable cursor as the poll
pub async fn sse_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Response {
    // Fail fast before committing to a stream response
    if let Err(e) = state.registry.get(&session_id).await {
        return e.into_response();
    }

    let dispatcher = Arc::clone(&state.dispatcher);

    let stream = futures::stream::unfold(query.after_seq, move |cursor| {
        let dispatcher = Arc::clone(&dispatcher);
        let session_id = session_id.clone();

        async move {
            loop {
                match dispatcher.poll(&session_id, cursor, true).await {
                    // Idle timeout with the session still alive; keep waiting
                    Ok(batch) if batch.events.is_empty() => continue,
                    Ok(batch) => {
                        let next_cursor = batch.last_seq;
                        match Event::default().event("transcript").json_data(&batch) {
                            Ok(event) => return Some((Ok::<_, Infallible>(event), next_cursor)),
                            Err(e) => {
                                warn!("Failed to encode SSE event: {}", e);
                                return None;
                            }
                        }
                    }
                    // Session ended or evicted; close the stream
                    Err(_) => return None,
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

/// GET /transcribe/status/:session_id
/// Statistics for a live session
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.registry.get(&session_id).await {
        Ok(session) => (StatusCode::OK, Json(session.stats().await)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /transcribe/end/:session_id
/// End a session; OK no matter how often it is called
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.registry.end(&session_id).await {
        Some(session) => {
            let stats = session.stats().await;
            let transcript = session.transcript().await;

            (
                StatusCode::OK,
                Json(EndSessionResponse {
                    session_id,
                    status: "ended".to_string(),
                    stats: Some(stats),
                    transcript,
                }),
            )
                .into_response()
        }
        // Already ended, evicted, or never started: still OK
        None => (
            StatusCode::OK,
            Json(EndSessionResponse {
                session_id,
                status: "ended".to_string(),
                stats: None,
                transcript: Vec::new(),
            }),
        )
            .into_response(),
    }
}

// ============================================================================
// Document and media handlers
// ============================================================================

/// POST /summarize
/// Accept uploaded PDF(s), extract text, and return a health summary
pub async fn summarize(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut documents: Vec<Vec<u8>> = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("files") {
                    continue;
                }

                // Allow common PDF signatures even if the browser MIME is missing
                let is_pdf = field
                    .content_type()
                    .map(|m| m.to_lowercase().contains("pdf"))
                    .unwrap_or(false)
                    || field
                        .file_name()
                        .map(|n| n.to_lowercase().ends_with(".pdf"))
                        .unwrap_or(false);
                if !is_pdf {
                    // Skip non-PDF files silently to keep the upload flow simple
                    continue;
                }

                match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => documents.push(bytes.to_vec()),
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Failed to read uploaded file: {}", e);
                        continue;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Invalid multipart payload: {e}"),
                    }),
                )
                    .into_response();
            }
        }
    }

    if documents.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No files provided. Please upload one or more PDFs.".to_string(),
            }),
        )
            .into_response();
    }

    match state.summarizer.summarize_pdfs(documents).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /upload-audio
/// Store uploaded audio files and report their playback URLs
pub async fn upload_audio(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut saved: Vec<SavedAudio> = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("audios") {
                    continue;
                }

                let Some(original_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let Some(ext) = media::allowed_audio_extension(&original_name) else {
                    continue;
                };

                let bytes = match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => bytes,
                    _ => continue,
                };

                let unique_name = media::storage_name(&ext);
                let dest = std::path::Path::new(&state.config.media.upload_dir).join(&unique_name);

                if let Err(e) = tokio::fs::write(&dest, &bytes).await {
                    warn!("Failed to store upload {}: {}", original_name, e);
                    continue;
                }

                saved.push(SavedAudio {
                    name: original_name,
                    url: format!("/media/audio/{unique_name}"),
                    mimetype: media::mime_for_extension(&ext).to_string(),
                });
            }
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Invalid multipart payload: {e}"),
                    }),
                )
                    .into_response();
            }
        }
    }

    if saved.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No valid audio files were uploaded.".to_string(),
            }),
        )
            .into_response();
    }

    (StatusCode::OK, Json(UploadAudioResponse { files: saved })).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
