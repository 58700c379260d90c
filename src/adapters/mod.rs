//! Port implementations.
//!
//! `live` talks to the real world, `memory` serves warehouse data loaded
//! from a YAML file, and `recording`/`replaying` wrap ports with
//! cassettes.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
