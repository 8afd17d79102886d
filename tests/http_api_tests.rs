// Integration tests for the HTTP surface
//
// These spin up the real router on an ephemeral port and exercise the
// transcription endpoints end to end: start/stream/poll/end semantics,
// error statuses, and audio upload + playback.

mod common;

use anyhow::Result;
use common::{test_config, DEMO_SEGMENT_BYTES};
use serde_json::Value;
use tempfile::TempDir;
use visit_scribe::config::{Config, SummaryConfig};
use visit_scribe::{create_router, AppState};

/// Bind the app on an ephemeral port; returns its base URL
async fn spawn_app(config: Config) -> Result<String> {
    let state = AppState::new(config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });

    Ok(format!("http://{addr}"))
}

fn app_config(upload_dir: &TempDir) -> Config {
    Config {
        transcribe: test_config(),
        summary: SummaryConfig {
            api_key: None,
            ..SummaryConfig::default()
        },
        media: visit_scribe::config::MediaConfig {
            upload_dir: upload_dir.path().to_string_lossy().into_owned(),
            ..visit_scribe::config::MediaConfig::default()
        },
        ..Config::default()
    }
}

#[tokio::test]
async fn start_reports_demo_backend_and_end_is_idempotent() -> Result<()> {
    let uploads = TempDir::new()?;
    let base = spawn_app(app_config(&uploads)).await?;
    let client = reqwest::Client::new();

    let start: Value = client
        .post(format!("{base}/transcribe/start"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    assert_eq!(start["backend"], "demo");
    let session_id = start["session_id"].as_str().expect("missing session_id");

    let first = client
        .post(format!("{base}/transcribe/end/{session_id}"))
        .send()
        .await?;
    assert_eq!(first.status(), 200);

    // Ending again is still OK, with no stats to report
    let second: Value = client
        .post(format!("{base}/transcribe/end/{session_id}"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(second["status"], "ended");
    assert!(second.get("stats").is_none());

    Ok(())
}

#[tokio::test]
async fn stream_then_poll_delivers_ordered_events() -> Result<()> {
    let uploads = TempDir::new()?;
    let base = spawn_app(app_config(&uploads)).await?;
    let client = reqwest::Client::new();

    let start: Value = client
        .post(format!("{base}/transcribe/start"))
        .send()
        .await?
        .json()
        .await?;
    let session_id = start["session_id"].as_str().expect("missing session_id");

    let accepted: Value = client
        .post(format!("{base}/transcribe/stream/{session_id}"))
        .body(vec![0u8; DEMO_SEGMENT_BYTES])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(accepted["bytes"], DEMO_SEGMENT_BYTES);

    let batch: Value = client
        .get(format!(
            "{base}/transcribe/poll/{session_id}?after_seq=0&wait=true"
        ))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let events = batch["events"].as_array().expect("missing events");
    assert!(!events.is_empty());
    assert_eq!(events[0]["sequence"], 1);

    client
        .post(format!("{base}/transcribe/end/{session_id}"))
        .send()
        .await?;
    Ok(())
}

#[tokio::test]
async fn error_statuses_map_the_taxonomy() -> Result<()> {
    let uploads = TempDir::new()?;
    let mut config = app_config(&uploads);
    config.transcribe.max_chunk_bytes = 1000;
    let base = spawn_app(config).await?;
    let client = reqwest::Client::new();

    // Unknown session: 404 on both stream and poll
    let resp = client
        .post(format!("{base}/transcribe/stream/visit-nope"))
        .body(vec![0u8; 10])
        .send()
        .await?;
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("{base}/transcribe/poll/visit-nope?after_seq=0"))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);

    // Oversized chunk: 413
    let start: Value = client
        .post(format!("{base}/transcribe/start"))
        .send()
        .await?
        .json()
        .await?;
    let session_id = start["session_id"].as_str().expect("missing session_id");

    let resp = client
        .post(format!("{base}/transcribe/stream/{session_id}"))
        .body(vec![0u8; 2000])
        .send()
        .await?;
    assert_eq!(resp.status(), 413);

    client
        .post(format!("{base}/transcribe/end/{session_id}"))
        .send()
        .await?;
    Ok(())
}

#[tokio::test]
async fn uploaded_audio_is_stored_and_served_back() -> Result<()> {
    let uploads = TempDir::new()?;
    let base = spawn_app(app_config(&uploads)).await?;
    let client = reqwest::Client::new();

    let payload = b"not really ogg, but stored verbatim".to_vec();
    let form = reqwest::multipart::Form::new().part(
        "audios",
        reqwest::multipart::Part::bytes(payload.clone()).file_name("visit-recording.ogg"),
    );

    let resp: Value = client
        .post(format!("{base}/upload-audio"))
        .multipart(form)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let files = resp["files"].as_array().expect("missing files");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "visit-recording.ogg");
    assert_eq!(files[0]["mimetype"], "audio/ogg");

    let url = files[0]["url"].as_str().expect("missing url");
    let served = client.get(format!("{base}{url}")).send().await?;
    assert_eq!(served.status(), 200);
    assert_eq!(served.bytes().await?.to_vec(), payload);

    Ok(())
}

#[tokio::test]
async fn upload_rejects_disallowed_file_types() -> Result<()> {
    let uploads = TempDir::new()?;
    let base = spawn_app(app_config(&uploads)).await?;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "audios",
        reqwest::multipart::Part::bytes(vec![1, 2, 3]).file_name("malware.exe"),
    );

    let resp = client
        .post(format!("{base}/upload-audio"))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    Ok(())
}

#[tokio::test]
async fn summarize_rejects_uploads_with_no_readable_text() -> Result<()> {
    let uploads = TempDir::new()?;
    let base = spawn_app(app_config(&uploads)).await?;
    let client = reqwest::Client::new();

    // Claims to be a PDF but extraction yields nothing readable
    let form = reqwest::multipart::Form::new().part(
        "files",
        reqwest::multipart::Part::bytes(b"junk bytes".to_vec()).file_name("records.pdf"),
    );

    let resp = client
        .post(format!("{base}/summarize"))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    Ok(())
}

#[tokio::test]
async fn health_endpoint_answers() -> Result<()> {
    let uploads = TempDir::new()?;
    let base = spawn_app(app_config(&uploads)).await?;

    let resp = reqwest::get(format!("{base}/health")).await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await?, "OK");

    Ok(())
}
