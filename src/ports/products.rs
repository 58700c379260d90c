//! Product catalogue port.

use super::PortFuture;
use crate::model::Product;

/// Looks products up in the catalogue.
pub trait ProductRepository: Send + Sync {
    /// Searches products whose id, name or article contains `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be queried.
    fn get_products(&self, query: &str) -> PortFuture<'_, Vec<Product>>;

    /// Fetches the products with the given ids, skipping unknown ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be queried.
    fn get_products_by_ids(&self, ids: &[String]) -> PortFuture<'_, Vec<Product>>;

    /// Finds the product carrying `barcode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue cannot be queried.
    fn find_product_by_barcode(&self, barcode: &str) -> PortFuture<'_, Option<Product>>;
}
