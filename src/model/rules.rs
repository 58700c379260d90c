//! Validation rule definitions attached to action steps.

use serde::{Deserialize, Serialize};

/// The check performed by a single rule item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationRuleKind {
    /// The value must be present and, for text, not blank.
    NotEmpty,
    /// The value must match one of the plan items in the context.
    FromPlan,
    /// The value's text projection must match the pattern.
    MatchesRegex {
        /// Regular expression source.
        pattern: String,
    },
    /// The value must be accepted by the remote validation API.
    ApiRequest {
        /// Endpoint path passed to the validation API.
        endpoint: String,
    },
}

/// One check plus the message shown when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRuleItem {
    /// What to check.
    #[serde(flatten)]
    pub kind: ValidationRuleKind,
    /// Message shown to the operator on failure.
    pub error_message: String,
}

impl ValidationRuleItem {
    /// Creates a rule item.
    #[must_use]
    pub fn new(kind: ValidationRuleKind, error_message: impl Into<String>) -> Self {
        Self { kind, error_message: error_message.into() }
    }
}

/// Ordered list of checks; evaluation stops at the first failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRule {
    /// Checks in evaluation order.
    pub items: Vec<ValidationRuleItem>,
}

impl ValidationRule {
    /// Creates a rule from its items.
    #[must_use]
    pub fn new(items: Vec<ValidationRuleItem>) -> Self {
        Self { items }
    }

    /// Returns `true` when the rule has no checks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
