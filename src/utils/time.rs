use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the epoch, used to qualify storage keys so repeated
/// submissions by the same student never collide.
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}
