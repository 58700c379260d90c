//! Recording adapter for the [`Clock`] port.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{lock, SharedRecorder};
use crate::ports::Clock;

/// Records every reading of the inner clock.
pub struct RecordingClock {
    inner: Arc<dyn Clock>,
    recorder: SharedRecorder,
}

impl RecordingClock {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Clock>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.inner.now();
        lock(&self.recorder).record("clock", "now", &(), &now);
        now
    }
}
