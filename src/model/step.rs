//! Action step templates.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rules::ValidationRule;

/// The category of object a step collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionObjectType {
    /// A catalogue product, without batch attributes.
    ClassifierProduct,
    /// A product with batch attributes.
    TaskProduct,
    /// A pallet.
    Pallet,
    /// A storage bin.
    Bin,
    /// A product together with a counted quantity.
    ProductQuantity,
}

impl fmt::Display for ActionObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ClassifierProduct => "CLASSIFIER_PRODUCT",
            Self::TaskProduct => "TASK_PRODUCT",
            Self::Pallet => "PALLET",
            Self::Bin => "BIN",
            Self::ProductQuantity => "PRODUCT_QUANTITY",
        };
        f.write_str(name)
    }
}

/// Which side of the movement a step collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    /// Not yet assigned to a side.
    #[default]
    Unassigned,
    /// Where the goods come from.
    Storage,
    /// Where the goods go to.
    Placement,
}

fn default_true() -> bool {
    true
}

/// One data-collection step of an action template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStep {
    /// Step identifier, unique within a template.
    pub id: String,
    /// Position within its storage or placement list.
    #[serde(default)]
    pub order: u32,
    /// Prompt shown to the operator.
    pub name: String,
    /// What the step collects.
    pub object_type: ActionObjectType,
    /// Whether a value must be supplied.
    #[serde(default)]
    pub is_required: bool,
    /// Whether the step may be left empty.
    #[serde(default)]
    pub can_skip: bool,
    /// Whether the operator may return to the previous step from here.
    #[serde(default = "default_true")]
    pub can_navigate_back: bool,
    /// Checks applied to the collected value.
    #[serde(default)]
    pub validation_rules: ValidationRule,
    /// Whether the accepted value goes into the auto-fill buffer.
    #[serde(default)]
    pub save_to_buffer: bool,
    /// Whether the step may be filled from the buffer.
    #[serde(default)]
    pub auto_fill: bool,
    /// Side of the movement, assigned when wizard steps are built.
    #[serde(default)]
    pub role: StepRole,
}

impl ActionStep {
    /// Creates a required, non-skippable step with no rules.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        object_type: ActionObjectType,
    ) -> Self {
        Self {
            id: id.into(),
            order: 0,
            name: name.into(),
            object_type,
            is_required: true,
            can_skip: false,
            can_navigate_back: true,
            validation_rules: ValidationRule::default(),
            save_to_buffer: false,
            auto_fill: false,
            role: StepRole::Unassigned,
        }
    }
}
