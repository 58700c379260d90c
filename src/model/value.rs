//! Values collected by wizard steps.

use serde::{Deserialize, Serialize};

use super::entity::{BinX, Pallet, Product, TaskProduct};
use super::step::StepRole;

/// A value produced by a wizard step.
///
/// Steps only ever collect one of these shapes, so results are matched
/// exhaustively instead of being inspected at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StepValue {
    /// A catalogue product.
    Product(Product),
    /// A product with batch attributes and quantity.
    TaskProduct(TaskProduct),
    /// A pallet.
    Pallet(Pallet),
    /// A storage bin.
    Bin(BinX),
    /// A bare number.
    Quantity(f64),
    /// A raw scan or typed string not yet resolved to a domain object.
    Text(String),
}

impl StepValue {
    /// Projects the value onto the string used for regex and remote checks.
    ///
    /// Bins and pallets project to their code, products to their id.
    #[must_use]
    pub fn as_match_text(&self) -> String {
        match self {
            Self::Product(product) => product.id.clone(),
            Self::TaskProduct(task_product) => task_product.product.id.clone(),
            Self::Pallet(pallet) => pallet.code.clone(),
            Self::Bin(bin) => bin.code.clone(),
            Self::Quantity(quantity) => quantity.to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    /// Returns the product id when the value carries a product.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        match self {
            Self::Product(product) => Some(&product.id),
            Self::TaskProduct(task_product) => Some(&task_product.product.id),
            _ => None,
        }
    }

    /// Returns `true` for a missing-looking value: blank text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// Short type name used in messages and logs.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Product(_) => "product",
            Self::TaskProduct(_) => "task product",
            Self::Pallet(_) => "pallet",
            Self::Bin(_) => "bin",
            Self::Quantity(_) => "quantity",
            Self::Text(_) => "text",
        }
    }
}

/// The accepted value of one step, tagged with the step's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Id of the step that produced the value.
    pub step_id: String,
    /// The coerced, validated value.
    pub value: StepValue,
    /// Whether the step collects the storage or the placement side.
    #[serde(default)]
    pub role: StepRole,
}
