//! Replaying adapter for the [`Clock`] port.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::next_output_or_panic;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::Clock;

/// Serves recorded clock readings.
pub struct ReplayingClock {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingClock {
    /// Replays from `replayer`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl Clock for ReplayingClock {
    /// # Panics
    ///
    /// Panics if the cassette has no reading left or the reading is not a timestamp.
    fn now(&self) -> DateTime<Utc> {
        let output = next_output_or_panic(&self.replayer, "clock", "now");
        match serde_json::from_value(output) {
            Ok(now) => now,
            Err(e) => panic!("clock::now: recorded value is not a timestamp: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn replayer(outputs: &[&str]) -> CassetteReplayer {
        let interactions = outputs
            .iter()
            .zip(0..)
            .map(|(output, seq)| Interaction {
                seq,
                port: "clock".into(),
                method: "now".into(),
                input: json!(null),
                output: json!(output),
            })
            .collect();
        CassetteReplayer::new(&Cassette {
            name: "clock".into(),
            recorded_at: Utc::now(),
            interactions,
        })
    }

    #[test]
    fn serves_readings_in_order() {
        let readings = ["2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z"];
        let clock = ReplayingClock::new(replayer(&readings));
        let first = clock.now();
        assert_eq!(first.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(clock.now() > first);
    }

    #[test]
    #[should_panic(expected = "Cassette exhausted")]
    fn running_out_panics() {
        let clock = ReplayingClock::new(replayer(&[]));
        let _ = clock.now();
    }
}
