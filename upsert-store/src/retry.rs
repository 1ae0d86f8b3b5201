//! Bounded exponential backoff around one batch submission.

use crate::cancel::CancelToken;
use crate::errors::SinkError;
use crate::record::FieldRecord;
use crate::sink::RemoteSink;

use std::time::Duration;
use tracing::warn;

/// Backoff knobs for a single batch.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Upper bound on rate-limited attempts before the batch is abandoned.
    pub max_retries: u32,
    /// Delay before the first retry; doubles after each one.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (0-based): `initial_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Terminal outcome of one batch after the executor is done with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The sink acknowledged the batch.
    Success,
    /// Rate-limit retries were exhausted; the batch was abandoned.
    Skipped { attempts: u32 },
}

/// Submits one batch, absorbing rate limits with exponential backoff.
///
/// Only [`SinkError::RateLimited`] is retried; any other sink error
/// propagates unchanged so the caller's loop aborts. After `max_retries`
/// rate-limited attempts the batch is given up as [`BatchOutcome::Skipped`]
/// and the job moves on. A cancellation during a backoff sleep abandons the
/// batch the same way, without another call to the sink.
pub async fn submit_with_retry(
    sink: &dyn RemoteSink,
    batch: &[FieldRecord],
    policy: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<BatchOutcome, SinkError> {
    let mut attempt: u32 = 0;
    let mut delay = policy.initial_delay;

    loop {
        match sink.upsert(batch).await {
            Ok(()) => return Ok(BatchOutcome::Success),
            Err(SinkError::RateLimited { retry_after_secs }) => {
                attempt += 1;
                if attempt >= policy.max_retries {
                    warn!(
                        attempts = attempt,
                        "rate limit retries exhausted, giving up on batch"
                    );
                    return Ok(BatchOutcome::Skipped { attempts: attempt });
                }
                warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    retry_after_secs,
                    "sink rate limited, backing off"
                );
                if !cancel.sleep(delay).await {
                    return Ok(BatchOutcome::Skipped { attempts: attempt });
                }
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }
}
