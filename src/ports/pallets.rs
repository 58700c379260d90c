//! Pallet port.

use super::PortFuture;
use crate::model::Pallet;

/// Looks up and manages pallets.
pub trait PalletRepository: Send + Sync {
    /// Searches pallets whose code contains `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if pallets cannot be queried.
    fn get_pallets(&self, query: &str) -> PortFuture<'_, Vec<Pallet>>;

    /// Finds the pallet with the given code.
    ///
    /// # Errors
    ///
    /// Returns an error if pallets cannot be queried.
    fn get_pallet_by_code(&self, code: &str) -> PortFuture<'_, Option<Pallet>>;

    /// Registers a new open pallet with a fresh code.
    ///
    /// # Errors
    ///
    /// Returns an error if the pallet cannot be created.
    fn create_pallet(&self) -> PortFuture<'_, Pallet>;

    /// Closes the pallet for further loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the pallet does not exist or cannot be closed.
    fn close_pallet(&self, code: &str) -> PortFuture<'_, Pallet>;

    /// Sends the pallet label to the printer.
    ///
    /// # Errors
    ///
    /// Returns an error if the pallet does not exist or printing fails.
    fn print_pallet_label(&self, code: &str) -> PortFuture<'_, ()>;
}
