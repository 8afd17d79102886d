// Integration tests for audio chunk ingestion
//
// These verify that chunks reach the backend in arrival order without loss,
// that the activity clock strictly increases, and that the size gate and
// state checks reject chunks without touching session stats.

mod common;

use anyhow::Result;
use common::{test_config, MockBackend};
use std::sync::Arc;
use visit_scribe::config::TranscribeConfig;
use visit_scribe::{ChunkIngestor, Session, SessionRegistry, TranscribeError};

#[tokio::test]
async fn chunks_are_forwarded_in_arrival_order() -> Result<()> {
    let (backend, state) = MockBackend::new();
    let session = Session::start("visit-ingest-1".to_string(), Box::new(backend)).await?;

    let chunks: Vec<Vec<u8>> = (0u8..50).map(|i| vec![i; 64]).collect();
    for chunk in &chunks {
        session.push_chunk(chunk).await?;
    }

    let forwarded = state.chunks.lock().unwrap().clone();
    assert_eq!(forwarded, chunks, "chunks reordered or lost");

    session.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn activity_clock_strictly_increases_per_chunk() -> Result<()> {
    let (backend, _state) = MockBackend::new();
    let session = Session::start("visit-ingest-2".to_string(), Box::new(backend)).await?;

    let mut last = session.last_activity_micros();
    for _ in 0..20 {
        session.push_chunk(&[0u8; 16]).await?;
        let now = session.last_activity_micros();
        assert!(now > last, "activity time did not strictly increase");
        last = now;
    }

    session.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn oversized_chunk_is_rejected_and_stats_untouched() -> Result<()> {
    let config = TranscribeConfig {
        max_chunk_bytes: 1000,
        ..test_config()
    };
    let registry = SessionRegistry::new(config);
    let ingestor = ChunkIngestor::new(Arc::clone(&registry));

    let session = registry.create().await?;
    let id = session.id().to_string();

    let oversized = vec![0u8; 2000];
    assert!(matches!(
        ingestor.ingest(&id, &oversized).await,
        Err(TranscribeError::ChunkTooLarge { size: 2000, limit: 1000 })
    ));

    let stats = session.stats().await;
    assert_eq!(stats.chunks_received, 0);
    assert_eq!(stats.bytes_received, 0);

    // A chunk within the limit is still accepted afterwards
    ingestor.ingest(&id, &[0u8; 500]).await?;
    assert_eq!(session.stats().await.chunks_received, 1);

    registry.end(&id).await;
    Ok(())
}

#[tokio::test]
async fn ingest_into_unknown_session_fails() -> Result<()> {
    let registry = SessionRegistry::new(test_config());
    let ingestor = ChunkIngestor::new(Arc::clone(&registry));

    assert!(matches!(
        ingestor.ingest("visit-never-started", &[0u8; 8]).await,
        Err(TranscribeError::SessionNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn chunk_against_ended_session_is_rejected_not_buffered() -> Result<()> {
    let (backend, state) = MockBackend::new();
    let session = Session::start("visit-ingest-3".to_string(), Box::new(backend)).await?;

    session.push_chunk(&[1u8; 8]).await?;
    session.shutdown().await;

    assert!(matches!(
        session.push_chunk(&[2u8; 8]).await,
        Err(TranscribeError::SessionNotActive(_))
    ));

    // The rejected chunk never reached the backend
    assert_eq!(state.chunks.lock().unwrap().len(), 1);
    assert_eq!(session.stats().await.chunks_received, 1);

    Ok(())
}

#[tokio::test]
async fn backend_failure_mid_stream_ends_only_that_session() -> Result<()> {
    let registry = SessionRegistry::new(test_config());
    let ingestor = ChunkIngestor::new(Arc::clone(&registry));

    // A healthy session that must be unaffected
    let healthy = registry.create().await?;
    let healthy_id = healthy.id().to_string();

    // A session whose backend drops mid-stream
    let (mut backend, _state) = MockBackend::new();
    backend.fail_pushes = true;
    let failing = Session::start("visit-ingest-4".to_string(), Box::new(backend)).await?;

    assert!(matches!(
        failing.push_chunk(&[0u8; 8]).await,
        Err(TranscribeError::BackendUnavailable(_))
    ));

    // Fault isolation: the other session keeps accepting audio
    ingestor.ingest(&healthy_id, &[0u8; 64]).await?;
    assert_eq!(healthy.stats().await.chunks_received, 1);

    failing.shutdown().await;
    registry.end(&healthy_id).await;
    Ok(())
}
