//! Ordering and eligibility rules over a task's planned actions.
//!
//! Actions come in three tiers: initial actions run first, regular
//! actions unlock once every initial action is done, and final actions
//! unlock once every regular action is done. Within a tier actions run in
//! ascending `order`.
//!
//! The validators answer these questions through a [`MemoCache`] keyed by
//! task id and `last_modified_at`, so any mutation that touches the task
//! invalidates earlier answers.

mod cache;
mod final_actions;
mod initial;
pub mod order;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use cache::{cache_key, MemoCache};
pub use final_actions::FinalActionsValidator;
pub use initial::InitialActionsValidator;

use crate::model::PlannedAction;

/// Why an action cannot be executed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionBlockReason {
    /// Nothing blocks the action.
    None,
    /// Some initial action is still pending.
    InitialActionsNotCompleted,
    /// A final action was requested while regular actions are pending.
    RegularActionsNotCompleted,
    /// Another action has to run first.
    OutOfOrder,
}

impl ActionBlockReason {
    /// Returns `true` unless the reason is [`ActionBlockReason::None`].
    #[must_use]
    pub fn is_blocked(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for ActionBlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::None => "not blocked",
            Self::InitialActionsNotCompleted => "initial actions are not completed",
            Self::RegularActionsNotCompleted => "regular actions are not completed",
            Self::OutOfOrder => "another action must be executed first",
        };
        f.write_str(text)
    }
}

/// Per-action dependency relation consulted by the out-of-order scan.
pub trait ActionDependencies: Send + Sync {
    /// Returns `true` when `action` may only run after `other` is done.
    fn can_be_executed_after(&self, action: &PlannedAction, other: &PlannedAction) -> bool;
}

/// Tier of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTier {
    /// Runs first.
    Initial,
    /// Runs between initial and final actions.
    Regular,
    /// Runs last.
    Final,
}

impl ActionTier {
    /// Tier of `action`. An action flagged both initial and final counts as initial.
    #[must_use]
    pub fn of(action: &PlannedAction) -> Self {
        if action.is_initial_action {
            Self::Initial
        } else if action.is_final_action {
            Self::Final
        } else {
            Self::Regular
        }
    }
}

/// Dependencies implied by order: within a tier, lower orders come first.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderDependencies;

impl ActionDependencies for OrderDependencies {
    fn can_be_executed_after(&self, action: &PlannedAction, other: &PlannedAction) -> bool {
        ActionTier::of(action) == ActionTier::of(other) && other.order < action.order
    }
}
