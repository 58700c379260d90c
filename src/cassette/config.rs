//! Per-port cassette selection for replay.

use std::path::PathBuf;

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Cassette files to replay, one optional path per port.
///
/// Ports without a path fall back to their live adapter.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Cassette for the clock.
    pub clock: Option<PathBuf>,
    /// Cassette for the id generator.
    pub id_gen: Option<PathBuf>,
    /// Cassette for the remote validation API.
    pub validation_api: Option<PathBuf>,
}

/// Replayers built from a [`CassetteConfig`].
#[derive(Debug)]
pub struct PortReplayers {
    /// Replayer for the clock.
    pub clock: Option<CassetteReplayer>,
    /// Replayer for the id generator.
    pub id_gen: Option<CassetteReplayer>,
    /// Replayer for the remote validation API.
    pub validation_api: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Uses one cassette for every port.
    #[must_use]
    pub fn single(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self { clock: Some(path.clone()), id_gen: Some(path.clone()), validation_api: Some(path) }
    }

    /// Loads every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Option<PathBuf>| -> Result<Option<CassetteReplayer>, String> {
            path.as_deref()
                .map(|p| Cassette::load(p).map(|c| CassetteReplayer::new(&c)))
                .transpose()
        };
        Ok(PortReplayers {
            clock: load(&self.clock)?,
            id_gen: load(&self.id_gen)?,
            validation_api: load(&self.validation_api)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_ports_have_no_replayer() {
        let replayers = CassetteConfig::default().load_all().unwrap();
        assert!(replayers.clock.is_none());
        assert!(replayers.id_gen.is_none());
        assert!(replayers.validation_api.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let config = CassetteConfig {
            clock: Some("/nonexistent/clock.yaml".into()),
            ..CassetteConfig::default()
        };
        assert!(config.load_all().unwrap_err().contains("Failed to read"));
    }
}
