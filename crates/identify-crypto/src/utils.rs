//! Wall-clock helpers shared by the identity and token layers.

use std::time::{SystemTime, UNIX_EPOCH};

fn since_epoch() -> std::time::Duration {
    // A clock set before 1970 reads as the epoch rather than aborting the caller.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Returns the current Unix timestamp in seconds.
///
/// Token `iat`/`exp` claims and identity `created_at` use this.
pub fn current_timestamp() -> u64 {
    since_epoch().as_secs()
}

/// Returns the current Unix timestamp in nanoseconds.
///
/// Used for time-ordered index keys. Saturates at `u64::MAX` (year 2554).
pub fn current_timestamp_nanos() -> u64 {
    u64::try_from(since_epoch().as_nanos()).unwrap_or(u64::MAX)
}
