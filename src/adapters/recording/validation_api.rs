//! Recording adapter for the [`ValidationApi`] port.

use std::sync::Arc;

use serde_json::json;

use super::{lock, SharedRecorder};
use crate::ports::{ApiValidation, PortFuture, ValidationApi};

/// Records remote validation calls and their outcomes, failures included.
pub struct RecordingValidationApi {
    inner: Arc<dyn ValidationApi>,
    recorder: SharedRecorder,
}

impl RecordingValidationApi {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn ValidationApi>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl ValidationApi for RecordingValidationApi {
    fn validate(&self, endpoint: &str, value: &str) -> PortFuture<'_, ApiValidation> {
        let endpoint = endpoint.to_string();
        let value = value.to_string();

        Box::pin(async move {
            let result = self.inner.validate(&endpoint, &value).await;
            let input = json!({ "endpoint": endpoint, "value": value });
            lock(&self.recorder).record_result("validation_api", "validate", &input, &result);
            result
        })
    }
}
