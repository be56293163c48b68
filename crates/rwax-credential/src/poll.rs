// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded confirmation poll.
//
// Waits a settle delay, then runs a status check on a fixed interval. Ends on
// the first confirmed sighting, after `max_attempts` checks, at the
// wall-clock deadline, or on cancellation, whichever comes first. Failed
// checks are reported and counted but never end the loop.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rwax_core::config::SubmissionConfig;
use rwax_core::error::Result;
use rwax_core::events::{PipelineEvent, PipelineObserver};
use rwax_core::CancelToken;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info, warn};

/// Timing bounds for one confirmation poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub settle_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
    /// Measured from the start of the poll, settle delay included.
    pub timeout: Duration,
}

impl From<&SubmissionConfig> for PollPolicy {
    fn from(config: &SubmissionConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            interval: config.poll_interval(),
            max_attempts: config.max_poll_attempts,
            timeout: config.confirmation_timeout(),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&SubmissionConfig::default())
    }
}

/// How a poll ended. Every variant carries the number of checks started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed { attempts: u32 },
    /// All checks used without a sighting.
    Exhausted { attempts: u32 },
    /// The deadline fired first.
    TimedOut { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match *self {
            Self::Confirmed { attempts }
            | Self::Exhausted { attempts }
            | Self::TimedOut { attempts }
            | Self::Cancelled { attempts } => attempts,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Poll `check` until it reports `true` or a bound is hit.
///
/// `check` receives the 1-based attempt number.
pub async fn poll_until<F, Fut>(
    policy: PollPolicy,
    mut check: F,
    observer: &dyn PipelineObserver,
    cancel: &CancelToken,
) -> PollOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + policy.timeout;
    let started = AtomicU32::new(0);

    let run = async {
        sleep(policy.settle_delay).await;
        for attempt in 1..=policy.max_attempts {
            started.store(attempt, Ordering::Relaxed);
            match check(attempt).await {
                Ok(confirmed) => {
                    debug!(attempt, max = policy.max_attempts, confirmed, "status check");
                    observer.on_event(&PipelineEvent::PollTick {
                        attempt,
                        max_attempts: policy.max_attempts,
                        confirmed,
                    });
                    if confirmed {
                        return true;
                    }
                }
                Err(err) => {
                    warn!(attempt, error = %err, "status check failed, continuing");
                    observer.on_event(&PipelineEvent::PollError {
                        attempt,
                        message: err.to_string(),
                    });
                }
            }
            if attempt < policy.max_attempts {
                sleep(policy.interval).await;
            }
        }
        false
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => PollOutcome::Cancelled {
            attempts: started.load(Ordering::Relaxed),
        },
        result = timeout_at(deadline, run) => {
            let attempts = started.load(Ordering::Relaxed);
            match result {
                Ok(true) => PollOutcome::Confirmed { attempts },
                Ok(false) => PollOutcome::Exhausted { attempts },
                Err(_) => PollOutcome::TimedOut { attempts },
            }
        }
    };

    info!(?outcome, "confirmation poll finished");
    outcome
}
