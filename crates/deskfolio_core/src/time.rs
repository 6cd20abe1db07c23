//! Wall-clock helpers. All persisted timestamps are Unix epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in epoch milliseconds; clocks before 1970 read as 0.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
