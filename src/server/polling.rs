use crate::bot::{Event, FlowController};
use crate::error::TransportError;
use crate::telegram::TelegramApi;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Long-polls `getUpdates` and feeds each update to the controller, one at a time.
pub struct PollingService {
    api: Arc<dyn TelegramApi>,
    controller: Arc<FlowController>,
    poll_timeout: u64,
    // Next update id to request; 0 until the first batch arrives.
    // Survives restarts so a crash does not replay handled updates.
    offset: AtomicI64,
}

impl PollingService {
    pub fn new(
        api: Arc<dyn TelegramApi>,
        controller: Arc<FlowController>,
        poll_timeout: u64,
    ) -> Self {
        Self {
            api,
            controller,
            poll_timeout,
            offset: AtomicI64::new(0),
        }
    }

    pub fn offset(&self) -> Option<i64> {
        match self.offset.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        }
    }

    /// Poll until cancelled (`Ok`) or until `getUpdates` fails (`Err`).
    /// Handler failures never surface here.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), TransportError> {
        info!("Starting Telegram long polling service");

        loop {
            let updates = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Polling stopped");
                    return Ok(());
                }
                res = self.api.get_updates(self.offset(), self.poll_timeout) => match res {
                    Ok(updates) => updates,
                    Err(e) => {
                        if e.is_timeout() {
                            warn!("getUpdates got no answer within the poll window");
                        }
                        return Err(e);
                    }
                },
            };

            if !updates.is_empty() {
                debug!("Received {} update(s)", updates.len());
            }

            for update in updates {
                self.offset.store(update.update_id + 1, Ordering::SeqCst);
                let Some(event) = Event::from_update(update) else {
                    debug!("Skipping update without a user");
                    continue;
                };
                let summary = event.to_string();
                if AssertUnwindSafe(self.controller.handle(event))
                    .catch_unwind()
                    .await
                    .is_err()
                {
                    error!("Handler panicked on {}; skipping update", summary);
                }
            }
        }
    }
}
