//! Retry utilities: backoff builders for lease table calls.
//!
//! Uses `backon`. Provides the polling schedule for the post-creation
//! readiness wait and the pause between batch-read rounds that came back
//! with unprocessed keys.

use std::time::Duration;

use backon::{ConstantBuilder, ExponentialBuilder};

/// Constant-interval schedule for waiting on a freshly created table.
///
/// One poll, then one poll per `interval`, for as many intervals as fit in
/// `timeout` (at least one retry). Callers still wrap the wait in a
/// wall-clock timeout since a single poll can itself stall.
pub fn readiness_backoff(interval: Duration, timeout: Duration) -> ConstantBuilder {
    ConstantBuilder::default()
        .with_delay(interval)
        .with_max_times(readiness_retries(interval, timeout))
}

fn readiness_retries(interval: Duration, timeout: Duration) -> usize {
    if interval.is_zero() {
        return 1;
    }
    let retries = timeout.as_nanos().div_ceil(interval.as_nanos());
    usize::try_from(retries).unwrap_or(usize::MAX).max(1)
}

/// Pause between BatchGetItem rounds that left keys unprocessed.
///
/// - Min delay: 25ms
/// - Max delay: 1s
/// - Unlimited attempts (the reader must not give up on pending keys)
/// - Jitter enabled
pub fn unprocessed_keys_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(25))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(usize::MAX)
        .with_jitter()
}
