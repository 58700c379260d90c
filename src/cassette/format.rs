//! Cassette data structures.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single call made through a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the recording, assigned by the recorder.
    pub seq: u64,
    /// Port name (`clock`, `id_gen`, `validation_api`).
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Arguments of the call.
    pub input: serde_json::Value,
    /// What the port returned. Fallible calls use `{"Ok": ..}` / `{"Err": ".."}`.
    pub output: serde_json::Value,
}

/// A recorded session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the recording was written.
    pub recorded_at: DateTime<Utc>,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Reads a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Keeps only the interactions of `port`, for splitting a session into
    /// per-port cassettes.
    #[must_use]
    pub fn for_port(&self, port: &str) -> Self {
        Self {
            name: format!("{}-{port}", self.name),
            recorded_at: self.recorded_at,
            interactions: self.interactions.iter().filter(|i| i.port == port).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Cassette {
        Cassette {
            name: "put-session".into(),
            recorded_at: Utc::now(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    port: "clock".into(),
                    method: "now".into(),
                    input: json!(null),
                    output: json!("2024-06-15T10:30:00Z"),
                },
                Interaction {
                    seq: 1,
                    port: "validation_api".into(),
                    method: "validate".into(),
                    input: json!({"endpoint": "bins/check", "value": "A-01"}),
                    output: json!({"Ok": {"is_valid": true, "error_message": null}}),
                },
            ],
        }
    }

    #[test]
    fn load_reads_written_yaml() {
        let dir = std::env::temp_dir().join("task_wizard_cassette_format");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.cassette.yaml");
        let cassette = session();
        std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();

        assert_eq!(Cassette::load(&path).unwrap(), cassette);
        assert!(Cassette::load(&dir.join("missing.yaml")).unwrap_err().contains("Failed to read"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn for_port_filters_interactions() {
        let clock = session().for_port("clock");
        assert_eq!(clock.name, "put-session-clock");
        assert_eq!(clock.interactions.len(), 1);
        assert_eq!(clock.interactions[0].method, "now");
    }
}
