// A simple module to define the time types used in the project
//
// The local wall clock is only one of the two inputs of the "now" used for
// timestamp based requests: the latest block timestamp is the other one, and
// the greater of both wins. Never use it alone to decide a window phase.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

#[inline]
pub fn get_current_time() -> Duration {
    // A clock set before the epoch is reported as the epoch itself
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

// Return timestamp in seconds, floored
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}
