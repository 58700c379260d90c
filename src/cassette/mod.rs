//! Cassettes: recorded port interactions that can be replayed later.
//!
//! A recording context captures every clock reading, generated id and
//! remote validation call of a wizard session. Replaying the cassette
//! reproduces the session exactly, which keeps fact ids and timestamps
//! stable in tests.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
