//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the wizard core and an
//! external system (time, IDs, remote validation, warehouse repositories).
//! Implementations live in `src/adapters/`.

pub mod bins;
pub mod clock;
pub mod id_gen;
pub mod pallets;
pub mod products;
pub mod tasks;
pub mod validation_api;

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

pub use bins::BinRepository;
pub use clock::Clock;
pub use id_gen::IdGenerator;
pub use pallets::PalletRepository;
pub use products::ProductRepository;
pub use tasks::TaskRepository;
pub use validation_api::{ApiValidation, ValidationApi};

/// Error type returned by every port.
pub type PortError = Box<dyn Error + Send + Sync>;

/// Boxed future returned by async port methods, keeping the traits dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;
