//! Replaying adapters: serve port calls from a cassette.

pub mod clock;
pub mod id_gen;
pub mod validation_api;

use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;

pub use clock::ReplayingClock;
pub use id_gen::ReplayingIdGenerator;
pub use validation_api::ReplayingValidationApi;

/// Takes the next recorded output for `port`/`method`.
///
/// Infallible ports have no way to report a short cassette, so running out
/// of recordings there is fatal.
///
/// # Panics
///
/// Panics with the replayer's message when the cassette has no matching
/// interaction left.
pub(crate) fn next_output_or_panic(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> Value {
    let next = replayer.lock().unwrap_or_else(PoisonError::into_inner).next_output(port, method);
    match next {
        Ok(output) => output,
        Err(message) => panic!("{message}"),
    }
}
