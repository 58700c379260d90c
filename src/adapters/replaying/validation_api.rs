//! Replaying adapter for the [`ValidationApi`] port.

use std::sync::{Mutex, PoisonError};

use crate::cassette::replayer::{replay_result, CassetteReplayer};
use crate::ports::{ApiValidation, PortFuture, ValidationApi};

/// Serves recorded validation verdicts, including recorded failures.
pub struct ReplayingValidationApi {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingValidationApi {
    /// Replays from `replayer`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl ValidationApi for ReplayingValidationApi {
    fn validate(&self, _endpoint: &str, _value: &str) -> PortFuture<'_, ApiValidation> {
        let next = self
            .replayer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_output("validation_api", "validate");
        Box::pin(async move { replay_result(next?) })
    }
}
