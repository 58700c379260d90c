//! Remote validation port used by `API_REQUEST` rules.

use serde::{Deserialize, Serialize};

use super::PortFuture;

/// Verdict returned by the validation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiValidation {
    /// Whether the backend accepted the value.
    pub is_valid: bool,
    /// Reason for rejection, if the backend gave one.
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Validates a value against a backend endpoint.
pub trait ValidationApi: Send + Sync {
    /// Asks `endpoint` whether `value` is acceptable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers garbage.
    fn validate(&self, endpoint: &str, value: &str) -> PortFuture<'_, ApiValidation>;
}
