//! Recording adapters: delegate to an inner port and log each call to a cassette.

pub mod clock;
pub mod id_gen;
pub mod validation_api;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cassette::recorder::CassetteRecorder;

pub use clock::RecordingClock;
pub use id_gen::RecordingIdGenerator;
pub use validation_api::RecordingValidationApi;

/// Recorder shared by every recording adapter of one context.
pub type SharedRecorder = Arc<Mutex<CassetteRecorder>>;

pub(crate) fn lock(recorder: &SharedRecorder) -> MutexGuard<'_, CassetteRecorder> {
    recorder.lock().unwrap_or_else(PoisonError::into_inner)
}
