//! Warehouse entities a wizard step can collect.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalogue identifier; the natural key for plan matching.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Vendor article number.
    #[serde(default)]
    pub article: Option<String>,
    /// Barcodes printed on the product packaging.
    #[serde(default)]
    pub barcodes: Vec<String>,
}

impl Product {
    /// Creates a product with no article and no barcodes.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), article: None, barcodes: Vec::new() }
    }
}

/// Condition of a product unit handled by a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Sellable stock.
    #[default]
    Standard,
    /// Damaged stock.
    Defective,
    /// Stock past its expiration date.
    Expired,
}

/// A product as it appears inside a task: the product plus batch attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProduct {
    /// The underlying catalogue product.
    pub product: Product,
    /// Batch expiration date, if tracked.
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    /// Stock condition.
    #[serde(default)]
    pub status: ProductStatus,
    /// Counted quantity.
    #[serde(default)]
    pub quantity: f64,
}

impl TaskProduct {
    /// Wraps a bare product with default batch attributes and zero quantity.
    #[must_use]
    pub fn from_product(product: Product) -> Self {
        Self { product, expiration_date: None, status: ProductStatus::Standard, quantity: 0.0 }
    }

    /// Returns a copy with the given quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// A pallet, identified by its printed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pallet {
    /// Printed pallet code.
    pub code: String,
    /// Whether the pallet has been closed for further loading.
    #[serde(default)]
    pub is_closed: bool,
}

impl Pallet {
    /// Creates an open pallet.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), is_closed: false }
    }
}

/// A storage bin (cell) in the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinX {
    /// Bin code as printed on the rack label.
    pub code: String,
    /// Warehouse zone the bin belongs to.
    #[serde(default)]
    pub zone: Option<String>,
}

impl BinX {
    /// Creates a bin without a zone.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), zone: None }
    }
}
