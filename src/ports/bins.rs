//! Storage bin port.

use super::PortFuture;
use crate::model::BinX;

/// Looks bins up in the warehouse topology.
pub trait BinRepository: Send + Sync {
    /// Searches bins whose code contains `query`, optionally within a zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be queried.
    fn get_bins(&self, query: &str, zone: Option<&str>) -> PortFuture<'_, Vec<BinX>>;

    /// Finds the bin with the given code.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be queried.
    fn get_bin_by_code(&self, code: &str) -> PortFuture<'_, Option<BinX>>;
}
