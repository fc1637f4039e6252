use chrono::{DateTime, Utc};

/// Time source for session deadlines. Injected so timeout behavior can be
/// tested without waiting out real timers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
