//! Exponential backoff with jitter around a single remote call
//!
//! Retries are deliberately narrow: only errors whose text looks transient
//! (busy server, flaky transport) are retried, and rate-limit errors are
//! handed straight back so the fetch layer can rotate to the next API key
//! instead of burning retries on a throttled one. Classification is purely
//! textual; the error type only needs to render a message.

use log::warn;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry bounds and delay shape for [`with_backoff`]
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Maximum number of invocations (not just re-tries)
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubles each attempt after
    pub initial_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based): `initial * 2^(attempt-1)`
    /// plus uniform jitter in `[0, max_jitter)`
    fn delay_for(self, attempt: u32) -> Duration {
        let base = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }
}

/// True when the error text indicates the key was rate-limited or out of quota
pub fn is_rate_limit_error(text: &str) -> bool {
    let t = text.to_lowercase();
    t.contains("rate") || t.contains("quota") || t.contains("resource_exhausted") || t.contains("429")
}

/// True when the error text indicates a condition worth retrying
pub fn is_transient_error(text: &str) -> bool {
    let t = text.to_lowercase();
    t.contains("try again") || t.contains("server") || t.contains("fetch failed")
}

/// Runs `op` with bounded exponential backoff
///
/// Every failure is classified from its display text, in this order:
/// rate-limit errors are returned immediately (zero retries, the caller
/// rotates keys); once `max_retries` invocations have failed the last error
/// is returned; non-transient errors are returned without another attempt;
/// anything else sleeps `initial_delay * 2^(attempt-1)` plus jitter and
/// tries again.
pub async fn with_backoff<T, E, F, Fut>(policy: BackoffPolicy, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let text = err.to_string();
                if is_rate_limit_error(&text) {
                    return Err(err);
                }
                attempt += 1;
                if attempt >= policy.max_retries {
                    warn!("giving up after {} attempts: {}", attempt, text);
                    return Err(err);
                }
                if !is_transient_error(&text) {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                warn!("attempt {} failed ({}), retrying in {:?}", attempt, text, delay);
                sleep(delay).await;
            }
        }
    }
}
