//! Recording adapter for the [`IdGenerator`] port.

use std::sync::Arc;

use super::{lock, SharedRecorder};
use crate::ports::IdGenerator;

/// Records every id produced by the inner generator.
pub struct RecordingIdGenerator {
    inner: Arc<dyn IdGenerator>,
    recorder: SharedRecorder,
}

impl RecordingIdGenerator {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn IdGenerator>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl IdGenerator for RecordingIdGenerator {
    fn generate_id(&self) -> String {
        let id = self.inner.generate_id();
        lock(&self.recorder).record("id_gen", "generate_id", &(), &id);
        id
    }
}
