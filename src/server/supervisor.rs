use crate::config::{parse_duration, SupervisorConfig};
use anyhow::Result;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// A run at least this long resets the consecutive-failure count
    pub reset_after: Duration,
    pub jitter: bool,
    pub max_restarts: Option<u32>,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            reset_after: Duration::from_secs(60),
            jitter: true,
            max_restarts: None,
        }
    }
}

impl RestartPolicy {
    pub fn from_config(config: &SupervisorConfig) -> Result<Self> {
        Ok(Self {
            base_delay: parse_duration(&config.restart_delay)?,
            max_delay: parse_duration(&config.max_restart_delay)?,
            reset_after: parse_duration(&config.reset_after)?,
            jitter: config.jitter,
            max_restarts: config.max_restarts,
        })
    }

    /// Delay before restart number `attempt` (1-based), without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        if !self.jitter {
            return backoff;
        }
        let spread = (self.base_delay.as_millis() / 2) as u64;
        backoff + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("{name} gave up after {restarts} restarts; last error: {last_error}")]
    GaveUp {
        name: String,
        restarts: u32,
        last_error: String,
    },
}

/// Re-runs a failing task with backoff until it finishes cleanly, the
/// token is cancelled, or the restart budget runs out.
pub struct Supervisor {
    name: String,
    policy: RestartPolicy,
}

impl Supervisor {
    pub fn new(name: impl Into<String>, policy: RestartPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
        }
    }

    pub async fn run<F, Fut, E>(
        &self,
        cancel: &CancellationToken,
        mut task: F,
    ) -> Result<(), SupervisorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        let mut consecutive: u32 = 0;

        loop {
            let started = Instant::now();
            let err = match task().await {
                Ok(()) => {
                    info!("{} finished", self.name);
                    return Ok(());
                }
                Err(e) => e,
            };

            if cancel.is_cancelled() {
                return Ok(());
            }

            if started.elapsed() >= self.policy.reset_after {
                consecutive = 0;
            }
            consecutive += 1;

            error!("{} crashed: {}", self.name, err);

            if let Some(max) = self.policy.max_restarts {
                if consecutive > max {
                    return Err(SupervisorError::GaveUp {
                        name: self.name.clone(),
                        restarts: consecutive - 1,
                        last_error: err.to_string(),
                    });
                }
            }

            let delay = self.policy.delay(consecutive);
            info!(
                "Restarting {} in {:?} (consecutive failures: {})",
                self.name, delay, consecutive
            );

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
