pub trait ClockPort: Send + Sync {
    /// Current time in unix seconds.
    fn now_secs(&self) -> i64;
}
