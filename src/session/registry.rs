use super::session::Session;
use crate::config::TranscribeConfig;
use crate::error::TranscribeError;
use crate::transcribe::BackendFactory;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Process-wide map of live transcription sessions
///
/// The only cross-session shared mutable state. The map lock is held for
/// map operations alone; everything per-session lives behind that session's
/// own locks, so sessions never contend with each other here.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    config: TranscribeConfig,
}

impl SessionRegistry {
    pub fn new(config: TranscribeConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        })
    }

    pub fn config(&self) -> &TranscribeConfig {
        &self.config
    }

    /// Create and register a session on a freshly selected backend
    ///
    /// Ids are UUID-based and never reused, so concurrent creates cannot
    /// collide.
    pub async fn create(&self) -> Result<Arc<Session>, TranscribeError> {
        let id = format!("visit-{}", uuid::Uuid::new_v4());

        let backend = BackendFactory::create(&self.config, &id).await?;
        let session = Arc::new(Session::start(id.clone(), backend).await?);

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id.clone(), Arc::clone(&session));
        }

        info!(
            "Registered session {} on {:?} backend",
            id,
            session.backend_kind()
        );

        Ok(session)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<Session>, TranscribeError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| TranscribeError::SessionNotFound(id.to_string()))
    }

    /// Unregister a session. Removing an unknown or already-removed id is a
    /// no-op so that client end and reaper eviction can race freely.
    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id)
    }

    /// Unregister and tear down a session
    ///
    /// Returns the session handle when it still existed, so callers can read
    /// the final transcript and stats. Idempotent: the teardown path inside
    /// the session releases the backend exactly once no matter how many
    /// callers get here.
    pub async fn end(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.remove(id).await?;
        session.shutdown().await;
        Some(session)
    }

    /// Snapshot of the currently registered sessions
    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
