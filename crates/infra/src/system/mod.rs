use chrono::Utc;

// Clock behind a trait so that tests can pin the current time.
pub trait ISys: Send + Sync {
    /// The current timestamp in UTC millis
    fn get_timestamp_millis(&self) -> i64;
}

/// System clock, used everywhere outside of tests
pub struct RealSys {}
impl ISys for RealSys {
    fn get_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
