//! One remote fetch cycle: cooldown gate, then a bounded walk of the key pool
//!
//! Every content fetcher funnels its remote attempt through
//! [`run_with_rotation`]. The driver consults the shared cooldown first, then
//! offers the operation one API key at a time. Rate-limited keys rotate to
//! the next; any other failure aborts the cycle with the remaining keys
//! untried. A cycle in which every key was rate-limited (or no keys exist)
//! engages the cooldown so subsequent cycles stay off the network.

use crate::cooldown::Cooldown;
use crate::gemini::{GeminiClient, GeminiError, GenerateContentRequest, GenerateContentResponse};
use crate::keys::ApiKeyPool;
use crate::retry::{self, with_backoff, BackoffPolicy};
use log::{error, warn};
use std::future::Future;
use std::time::Duration;

/// How long remote fetching stays suppressed after exhausting every key
pub const COOLDOWN_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Issues one `generateContent` call through the full resilience stack:
/// cooldown gate, key rotation, and per-key retry with backoff
pub async fn fetch_content(
    gemini: &GeminiClient,
    keys: &ApiKeyPool,
    cooldown: &Cooldown,
    policy: BackoffPolicy,
    label: &str,
    model: &str,
    request: &GenerateContentRequest,
) -> Option<GenerateContentResponse> {
    run_with_rotation(keys, cooldown, COOLDOWN_PERIOD, label, |key| {
        let request = request.clone();
        async move {
            with_backoff(policy, || gemini.generate_content(&key, model, &request)).await
        }
    })
    .await
}

/// Runs `attempt` against keys from one rotation until one succeeds
///
/// Returns the first success, or `None` when the cooldown was active, a
/// non-rate-limit error aborted the cycle, or every key came back
/// rate-limited (which engages the cooldown for `period`).
pub async fn run_with_rotation<T, F, Fut>(
    keys: &ApiKeyPool,
    cooldown: &Cooldown,
    period: Duration,
    label: &str,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, GeminiError>>,
{
    if cooldown.is_active() {
        warn!("{}: API cooldown active, skipping remote fetch", label);
        return None;
    }

    for key in keys.rotation() {
        match attempt(key).await {
            Ok(value) => return Some(value),
            Err(e) => {
                let text = e.to_string();
                if retry::is_rate_limit_error(&text) {
                    warn!("{}: key rate-limited, rotating to next ({})", label, text);
                    continue;
                }
                error!("{}: remote fetch failed: {}", label, text);
                return None;
            }
        }
    }

    warn!(
        "{}: all API keys exhausted, suppressing remote fetches for {:?}",
        label, period
    );
    cooldown.engage(period);
    None
}
