//! Backoff delay curves.
//!
//! Two independent curves live here:
//! - [`retry_delay`]: the whole-operation retry curve, `1000^(1 + attempt/6)` ms,
//!   capped and then jittered by [`apply_jitter`].
//! - [`poll_delay`]: plain doubling from a base delay, used when polling for receipts.

use rand::Rng;
use std::time::Duration;

/// Ceiling for a single retry wait.
pub const MAX_RETRY_WAIT: Duration = Duration::from_secs(120);

/// Default jitter ratio (+/- 20%).
pub const DEFAULT_JITTER: f64 = 0.2;

/// Un-jittered wait before the retry that follows failed attempt number `attempt` (0-based).
///
/// Non-decreasing in `attempt` and never above `max_wait`.
pub fn retry_delay(attempt: u32, max_wait: Duration) -> Duration {
    let exponent = 1.0 + f64::from(attempt) / 6.0;
    let wait_ms = 1000f64.powf(exponent);
    let max_ms = max_wait.as_millis() as f64;

    Duration::from_millis(wait_ms.min(max_ms) as u64)
}

/// Scale `delay` by a uniform factor in `[1 - jitter, 1 + jitter]`, never exceeding `max_wait`.
pub fn apply_jitter(delay: Duration, jitter: f64, max_wait: Duration) -> Duration {
    let jitter = jitter.clamp(0.0, 0.99);
    if jitter == 0.0 || delay.is_zero() {
        return delay.min(max_wait);
    }

    let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
    delay.mul_f64(factor).min(max_wait)
}

/// Doubling delay for poll number `attempt` (0-based), capped at `max`.
pub fn poll_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(31));
    base.saturating_mul(factor).min(max)
}
