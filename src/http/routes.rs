use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_dir = state.config.media.upload_dir.clone();
    let static_dir = state.config.media.static_dir.clone();
    let body_limit = state.config.media.max_upload_mb * 1024 * 1024;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Live transcription
        .route("/transcribe/start", post(handlers::start_session))
        .route(
            "/transcribe/stream/:session_id",
            post(handlers::stream_audio),
        )
        .route("/transcribe/poll/:session_id", get(handlers::poll_events))
        .route("/transcribe/events/:session_id", get(handlers::sse_events))
        .route(
            "/transcribe/status/:session_id",
            get(handlers::session_status),
        )
        .route("/transcribe/end/:session_id", post(handlers::end_session))
        // Documents and media
        .route("/summarize", post(handlers::summarize))
        .route("/upload-audio", post(handlers::upload_audio))
        .nest_service("/media/audio", ServeDir::new(upload_dir))
        // Single-page UI
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .layer(DefaultBodyLimit::max(body_limit))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
