//! System clock.

use chrono::{DateTime, Utc};

use crate::ports::Clock;

/// Reads the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
