//! Runtime configuration from the environment.
//!
//! Values come from process environment variables, with a `.env` file in
//! the working directory loaded first. CLI flags override what is read
//! here.

use std::path::PathBuf;

/// Base URL of the remote validation service.
pub const VALIDATION_URL_VAR: &str = "TASK_WIZARD_VALIDATION_URL";
/// Log filter directive, in `EnvFilter` syntax.
pub const LOG_VAR: &str = "TASK_WIZARD_LOG";
/// Cassette path to record port interactions to.
pub const RECORD_VAR: &str = "TASK_WIZARD_RECORD";
/// Cassette path to replay port interactions from.
pub const REPLAY_VAR: &str = "TASK_WIZARD_REPLAY";

/// Filter used when nothing is configured.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Base URL for `API_REQUEST` rules; without it those rules fail.
    pub validation_url: Option<String>,
    /// Log filter directive.
    pub log_filter: String,
    /// Record port interactions to this cassette.
    pub record: Option<PathBuf>,
    /// Replay port interactions from this cassette.
    pub replay: Option<PathBuf>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            validation_url: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            record: None,
            replay: None,
        }
    }
}

impl WizardConfig {
    /// Loads `.env` (if present) and reads the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            validation_url: get(VALIDATION_URL_VAR),
            log_filter: get(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            record: get(RECORD_VAR).map(PathBuf::from),
            replay: get(REPLAY_VAR).map(PathBuf::from),
        }
    }
}
