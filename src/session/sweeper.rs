use super::{Clock, SessionStore};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Background task that drops uploads nobody named in time.
pub struct SessionSweeper {
    store: SessionStore,
    clock: Arc<dyn Clock>,
    interval: Duration,
    ttl: Duration,
}

impl SessionSweeper {
    pub fn new(
        store: SessionStore,
        clock: Arc<dyn Clock>,
        interval: Duration,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            interval,
            ttl,
        }
    }

    /// One pass over the store. Returns the evicted user ids.
    pub async fn run_once(&self) -> Vec<i64> {
        let now = self.clock.now();
        let evicted = self.store.sweep(now, self.ttl).await;
        for user_id in &evicted {
            info!("Cleaned up expired upload for user {}", user_id);
        }
        evicted
    }

    /// Start sweeping on the runtime until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "Starting session sweeper (interval: {:?}, ttl: {:?})",
            self.interval, self.ttl
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    // A failed pass must not end the loop
                    match AssertUnwindSafe(self.run_once()).catch_unwind().await {
                        Ok(evicted) => {
                            if !evicted.is_empty() {
                                debug!("Sweep evicted {} session(s)", evicted.len());
                            }
                        }
                        Err(_) => error!("Session sweep pass panicked; continuing"),
                    }
                }
            }
        }
    }
}
