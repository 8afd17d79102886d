use super::registry::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Background sweep that evicts abandoned sessions
///
/// A session whose last activity is older than the configured timeout is
/// torn down through the same idempotent path as an explicit end, so racing
/// a client's end call is harmless. Each sweep iterates a snapshot; the
/// registry lock is never held across session teardown.
pub struct Reaper {
    registry: Arc<SessionRegistry>,
    interval: Duration,
    timeout: Duration,
}

impl Reaper {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        let interval = registry.config().reaper_interval();
        let timeout = registry.config().session_timeout();
        Self {
            registry,
            interval,
            timeout,
        }
    }

    /// Run the periodic sweep until the process exits
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Reaper started: sweep every {:?}, session timeout {:?}",
                self.interval, self.timeout
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }

    /// One pass over the registry; returns how many sessions were evicted
    pub async fn sweep(&self) -> usize {
        let snapshot = self.registry.snapshot().await;
        let mut evicted = 0;

        for session in snapshot {
            let idle = session.idle_for();
            if idle > self.timeout {
                info!(
                    "Reaping session {} idle for {:.1}s",
                    session.id(),
                    idle.as_secs_f64()
                );
                self.registry.end(session.id()).await;
                evicted += 1;
            } else {
                debug!(
                    "Session {} idle for {:.1}s, keeping",
                    session.id(),
                    idle.as_secs_f64()
                );
            }
        }

        evicted
    }
}
