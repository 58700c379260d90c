//! Serves recorded interactions back in order.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::format::{Cassette, Interaction};
use crate::ports::PortError;

/// Replays a cassette, one queue per port/method pair.
///
/// Each pair keeps its own cursor, so interleaving between ports does not
/// have to match the recording exactly.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<(String, String), Vec<Interaction>>,
    cursors: HashMap<(String, String), usize>,
}

impl CassetteReplayer {
    /// Indexes the interactions of `cassette`.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push(interaction.clone());
        }
        Self { queues, cursors: HashMap::new() }
    }

    /// Returns the output of the next recorded call of `port`/`method`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the pair when nothing was recorded for it
    /// or every recorded call has been served.
    pub fn next_output(&mut self, port: &str, method: &str) -> Result<Value, String> {
        let key = (port.to_string(), method.to_string());
        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            available.sort();
            return Err(format!(
                "Cassette exhausted: no interactions recorded for {port}::{method}. Available: [{}]",
                available.join(", ")
            ));
        };
        let cursor = self.cursors.entry(key).or_insert(0);
        let interaction = queue.get(*cursor).ok_or_else(|| {
            format!(
                "Cassette exhausted: all {} interactions for {port}::{method} were consumed",
                queue.len()
            )
        })?;
        *cursor += 1;
        Ok(interaction.output.clone())
    }
}

/// Decodes a recorded `{"Ok": value}` / `{"Err": message}` output.
///
/// # Errors
///
/// Returns the recorded error, or a decoding error for a malformed output.
pub fn replay_result<T: DeserializeOwned>(output: Value) -> Result<T, PortError> {
    match output {
        Value::Object(mut map) if map.contains_key("Ok") => {
            let value = map.remove("Ok").unwrap_or(Value::Null);
            serde_json::from_value(value)
                .map_err(|e| format!("Malformed recorded value: {e}").into())
        }
        Value::Object(map) if map.contains_key("Err") => {
            let message =
                map.get("Err").and_then(Value::as_str).unwrap_or("unknown error").to_string();
            Err(message.into())
        }
        other => Err(format!("Recorded output is not a result: {other}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, output: Value) -> Interaction {
        Interaction { seq, port: port.into(), method: "call".into(), input: Value::Null, output }
    }

    fn replayer() -> CassetteReplayer {
        CassetteReplayer::new(&Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            interactions: vec![
                interaction(0, "clock", json!(1)),
                interaction(1, "id_gen", json!("a")),
                interaction(2, "clock", json!(2)),
            ],
        })
    }

    #[test]
    fn serves_each_pair_in_order() {
        let mut replayer = replayer();
        assert_eq!(replayer.next_output("id_gen", "call").unwrap(), json!("a"));
        assert_eq!(replayer.next_output("clock", "call").unwrap(), json!(1));
        assert_eq!(replayer.next_output("clock", "call").unwrap(), json!(2));
        assert!(replayer.next_output("clock", "call").unwrap_err().contains("were consumed"));
        assert!(replayer.next_output("shell", "run").unwrap_err().contains("clock::call"));
    }

    #[test]
    fn replay_result_follows_ok_err_convention() {
        let ok: Result<u32, _> = replay_result(json!({"Ok": 7}));
        assert_eq!(ok.unwrap(), 7);
        let err: Result<u32, _> = replay_result(json!({"Err": "boom"}));
        assert_eq!(err.unwrap_err().to_string(), "boom");
        let bad: Result<u32, _> = replay_result(json!(3));
        assert!(bad.is_err());
    }
}
