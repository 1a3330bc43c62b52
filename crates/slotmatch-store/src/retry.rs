//! Conflict-retry loop for optimistic-concurrency writes.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::StoreResult;

/// Attempts per mutation before a conflict is surfaced as fatal.
pub const CONFLICT_ATTEMPTS: u32 = 3;

/// Delay before the first conflict retry; doubles per attempt.
pub const CONFLICT_BASE_DELAY: Duration = Duration::from_millis(200);

/// Runs `operation` until it succeeds, fails with a non-conflict error, or
/// exhausts `attempts`.
///
/// The operation is expected to perform the full read-modify-write cycle
/// so each retry sees the latest document. Delays double per attempt
/// starting from `base_delay`.
pub async fn with_conflict_retry<T, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_conflict() && attempt + 1 < attempts => {
                let delay = base_delay * 2u32.saturating_pow(attempt);
                attempt += 1;
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "store write conflicted, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
