//! Replaying adapter for the [`IdGenerator`] port.

use std::sync::Mutex;

use super::next_output_or_panic;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::IdGenerator;

/// Serves recorded ids.
pub struct ReplayingIdGenerator {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingIdGenerator {
    /// Replays from `replayer`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl IdGenerator for ReplayingIdGenerator {
    /// # Panics
    ///
    /// Panics if the cassette has no id left or the recorded id is not a string.
    fn generate_id(&self) -> String {
        match next_output_or_panic(&self.replayer, "id_gen", "generate_id") {
            serde_json::Value::String(id) => id,
            other => panic!("id_gen::generate_id: recorded value is not a string: {other}"),
        }
    }
}
