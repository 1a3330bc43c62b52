//! Retry loop for transient gateway failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ProviderResult;

/// Attempts per gateway call before a transient failure becomes fatal.
pub const RETRY_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles per attempt.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts `attempts`. Only errors whose code is retryable (network, rate
/// limit, 5xx) trigger another attempt.
pub async fn with_transient_retry<T, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                let delay = base_delay * 2u32.saturating_pow(attempt);
                attempt += 1;
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    code = %err.code(),
                    "gateway call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
