use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Whole seconds left until `expires_at`, never negative.
pub fn seconds_until(expires_at: DateTime<Utc>) -> i64 {
    let remaining = (expires_at - now()).num_seconds();
    if remaining < 0 {
        0
    } else {
        remaining
    }
}
