//! Captures interactions and writes them as a cassette.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use super::format::{Cassette, Interaction};

/// Accumulates interactions in memory until [`CassetteRecorder::save`].
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// Creates a recorder that will write to `path`.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), interactions: Vec::new() }
    }

    /// Where the cassette will be written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Records a call. Values that fail to serialize are stored as `null`.
    pub fn record(
        &mut self,
        port: &str,
        method: &str,
        input: &impl Serialize,
        output: &impl Serialize,
    ) {
        let input = serde_json::to_value(input).unwrap_or(Value::Null);
        let output = serde_json::to_value(output).unwrap_or(Value::Null);
        self.push(port, method, input, output);
    }

    /// Records a fallible call as `{"Ok": value}` or `{"Err": message}`.
    pub fn record_result<T: Serialize, E: Display>(
        &mut self,
        port: &str,
        method: &str,
        input: &impl Serialize,
        result: &Result<T, E>,
    ) {
        let input = serde_json::to_value(input).unwrap_or(Value::Null);
        let output = match result {
            Ok(value) => json!({ "Ok": serde_json::to_value(value).unwrap_or(Value::Null) }),
            Err(e) => json!({ "Err": e.to_string() }),
        };
        self.push(port, method, input, output);
    }

    fn push(&mut self, port: &str, method: &str, input: Value, output: Value) {
        let seq = self.interactions.len() as u64;
        self.interactions.push(Interaction {
            seq,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
    }

    /// Writes everything recorded so far to the cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            interactions: self.interactions.clone(),
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_sequence_and_saves() {
        let dir = std::env::temp_dir().join("task_wizard_recorder");
        let path = dir.join("nested").join("session.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "recording");
        recorder.record("id_gen", "generate_id", &(), &"fact-1");
        let failed: Result<bool, String> = Err("timeout".into());
        recorder.record_result("validation_api", "validate", &("bins/check", "A-01"), &failed);
        assert_eq!(recorder.len(), 2);

        assert_eq!(recorder.save().unwrap(), path);
        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.name, "recording");
        assert_eq!(cassette.interactions[1].seq, 1);
        assert_eq!(cassette.interactions[1].output, json!({"Err": "timeout"}));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
