use crate::config::Config;
use crate::session::{ChunkIngestor, EventDispatcher, SessionRegistry};
use crate::summary::Summarizer;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
    pub ingestor: Arc<ChunkIngestor>,
    pub dispatcher: Arc<EventDispatcher>,
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = SessionRegistry::new(config.transcribe.clone());
        let ingestor = Arc::new(ChunkIngestor::new(Arc::clone(&registry)));
        let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&registry)));
        let summarizer = Arc::new(Summarizer::new(&config.summary));

        Self {
            config: Arc::new(config),
            registry,
            ingestor,
            dispatcher,
            summarizer,
        }
    }
}
