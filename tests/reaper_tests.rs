// Integration tests for reaper eviction
//
// These verify that sessions idle past the configured timeout are evicted
// on the next sweep, that active sessions survive, and that eviction and
// explicit end converge without double-releasing the backend.

mod common;

use anyhow::Result;
use common::{test_config, DEMO_SEGMENT_BYTES};
use std::sync::Arc;
use std::time::Duration;
use visit_scribe::config::TranscribeConfig;
use visit_scribe::{ChunkIngestor, EventDispatcher, Reaper, SessionRegistry, TranscribeError};

fn reaper_config() -> TranscribeConfig {
    TranscribeConfig {
        session_timeout_secs: 0, // any measurable idle time exceeds this
        ..test_config()
    }
}

#[tokio::test]
async fn idle_session_is_evicted_on_the_next_sweep() -> Result<()> {
    let registry = SessionRegistry::new(reaper_config());
    let reaper = Reaper::new(Arc::clone(&registry));

    let session = registry.create().await?;
    let id = session.id().to_string();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(reaper.sweep().await, 1);
    assert!(registry.is_empty().await);

    // Follow-up traffic sees a clean SessionNotFound
    let ingestor = ChunkIngestor::new(Arc::clone(&registry));
    let dispatcher = EventDispatcher::new(Arc::clone(&registry));
    assert!(matches!(
        ingestor.ingest(&id, &[0u8; 8]).await,
        Err(TranscribeError::SessionNotFound(_))
    ));
    assert!(matches!(
        dispatcher.poll(&id, 0, false).await,
        Err(TranscribeError::SessionNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn recently_active_session_survives_the_sweep() -> Result<()> {
    let config = TranscribeConfig {
        session_timeout_secs: 60,
        ..test_config()
    };
    let registry = SessionRegistry::new(config);
    let reaper = Reaper::new(Arc::clone(&registry));
    let ingestor = ChunkIngestor::new(Arc::clone(&registry));

    let session = registry.create().await?;
    let id = session.id().to_string();

    ingestor.ingest(&id, &vec![0u8; DEMO_SEGMENT_BYTES]).await?;

    assert_eq!(reaper.sweep().await, 0);
    assert!(registry.get(&id).await.is_ok());

    registry.end(&id).await;
    Ok(())
}

#[tokio::test]
async fn sweep_evicts_only_the_idle_sessions() -> Result<()> {
    let config = TranscribeConfig {
        session_timeout_secs: 1,
        ..test_config()
    };
    let registry = SessionRegistry::new(config);
    let reaper = Reaper::new(Arc::clone(&registry));
    let ingestor = ChunkIngestor::new(Arc::clone(&registry));

    let idle = registry.create().await?;
    let idle_id = idle.id().to_string();

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let fresh = registry.create().await?;
    let fresh_id = fresh.id().to_string();
    ingestor.ingest(&fresh_id, &vec![0u8; DEMO_SEGMENT_BYTES]).await?;

    assert_eq!(reaper.sweep().await, 1);
    assert!(matches!(
        registry.get(&idle_id).await,
        Err(TranscribeError::SessionNotFound(_))
    ));
    assert!(registry.get(&fresh_id).await.is_ok());

    registry.end(&fresh_id).await;
    Ok(())
}

#[tokio::test]
async fn eviction_racing_explicit_end_is_harmless() -> Result<()> {
    let registry = SessionRegistry::new(reaper_config());

    let session = registry.create().await?;
    let id = session.id().to_string();

    tokio::time::sleep(Duration::from_millis(50)).await;

    // Both teardown paths fire; the shared shutdown is idempotent
    let sweep = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { Reaper::new(registry).sweep().await })
    };
    registry.end(&id).await;
    sweep.await?;

    assert!(registry.is_empty().await);
    Ok(())
}
