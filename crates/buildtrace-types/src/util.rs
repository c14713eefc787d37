use chrono::Utc;

/// Current wall-clock time as epoch milliseconds.
///
/// All persisted timestamps (run and task start/end) use this unit.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
