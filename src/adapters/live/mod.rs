//! Live adapters: system clock, random ids and the HTTP validation API.

pub mod clock;
pub mod id_gen;
pub mod validation_api;

pub use clock::LiveClock;
pub use id_gen::LiveIdGenerator;
pub use validation_api::HttpValidationApi;
