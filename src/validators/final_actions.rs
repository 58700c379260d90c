//! Rules for the regular and final tiers, and the strict execution order.

use std::sync::Arc;

use super::cache::{cache_key, MemoCache};
use super::initial::InitialActionsValidator;
use super::order;
use super::{ActionBlockReason, ActionDependencies};
use crate::model::{PlannedAction, Task};

fn is_final(action: &PlannedAction) -> bool {
    action.is_final_action && !action.is_initial_action
}

fn is_regular(action: &PlannedAction) -> bool {
    action.is_regular()
}

/// Answers ordering questions across all three tiers.
pub struct FinalActionsValidator {
    initial: Arc<InitialActionsValidator>,
    dependencies: Arc<dyn ActionDependencies>,
    flags: MemoCache<bool>,
    ids: MemoCache<Option<String>>,
    reasons: MemoCache<ActionBlockReason>,
}

impl FinalActionsValidator {
    /// Creates a validator on top of `initial`, using `dependencies` for the out-of-order scan.
    #[must_use]
    pub fn new(
        initial: Arc<InitialActionsValidator>,
        dependencies: Arc<dyn ActionDependencies>,
    ) -> Self {
        Self {
            initial,
            dependencies,
            flags: MemoCache::new(),
            ids: MemoCache::new(),
            reasons: MemoCache::new(),
        }
    }

    /// The initial-tier validator this one builds on.
    #[must_use]
    pub fn initial(&self) -> &InitialActionsValidator {
        &self.initial
    }

    /// Every regular action is completed or skipped.
    pub fn are_regular_actions_completed(&self, task: &Task) -> bool {
        self.flags.get_or_compute(cache_key("regular_completed", task, &[]), || {
            order::all_completed(&task.planned_actions, is_regular)
        })
    }

    /// Final actions are unlocked: the initial and regular tiers are done.
    pub fn can_execute_final_actions(&self, task: &Task) -> bool {
        self.flags.get_or_compute(cache_key("final_unlocked", task, &[]), || {
            self.initial.are_initial_actions_completed(task)
                && self.are_regular_actions_completed(task)
        })
    }

    /// The task has at least one final action.
    pub fn has_final_actions(&self, task: &Task) -> bool {
        self.flags.get_or_compute(cache_key("final_any", task, &[]), || {
            task.planned_actions.iter().any(is_final)
        })
    }

    /// Every final action is completed or skipped.
    pub fn are_final_actions_completed(&self, task: &Task) -> bool {
        self.flags.get_or_compute(cache_key("final_completed", task, &[]), || {
            order::all_completed(&task.planned_actions, is_final)
        })
    }

    /// A lower-ordered final action is still pending.
    pub fn is_final_action_out_of_order(&self, task: &Task, action_id: &str) -> bool {
        self.flags.get_or_compute(cache_key("final_out_of_order", task, &[action_id]), || {
            order::is_out_of_order(&task.planned_actions, action_id, is_final)
        })
    }

    /// Every action of the task is completed or skipped.
    pub fn can_complete_task(&self, task: &Task) -> bool {
        self.flags.get_or_compute(cache_key("task_done", task, &[]), || {
            order::all_completed(&task.planned_actions, |_| true)
        })
    }

    /// The one action that should run next.
    ///
    /// The next pending initial action if any, else the next pending
    /// regular action, else the next pending final action once final
    /// actions are unlocked.
    pub fn next_action_id_in_strict_order(&self, task: &Task) -> Option<String> {
        self.ids.get_or_compute(cache_key("strict_next", task, &[]), || {
            if let Some(id) = self.initial.next_initial_action_id(task) {
                return Some(id);
            }
            if let Some(action) = order::next_incomplete(&task.planned_actions, is_regular) {
                return Some(action.id.clone());
            }
            if self.can_execute_final_actions(task) {
                return order::next_incomplete(&task.planned_actions, is_final)
                    .map(|action| action.id.clone());
            }
            None
        })
    }

    /// Why `action_id` cannot run now, or [`ActionBlockReason::None`].
    ///
    /// Checks, in order: initial actions are never blocked; pending initial
    /// actions block everything else; pending regular actions block final
    /// actions; the strict order must point at this action; no pending
    /// action may be one this action depends on.
    pub fn action_block_reason(&self, task: &Task, action_id: &str) -> ActionBlockReason {
        self.reasons.get_or_compute(cache_key("block_reason", task, &[action_id]), || {
            let Some(action) = task.find_action(action_id) else {
                return ActionBlockReason::None;
            };
            if action.is_initial_action {
                return ActionBlockReason::None;
            }
            if !self.initial.are_initial_actions_completed(task) {
                return ActionBlockReason::InitialActionsNotCompleted;
            }
            if action.is_final_action && !self.are_regular_actions_completed(task) {
                return ActionBlockReason::RegularActionsNotCompleted;
            }
            if self.is_blocked_by_strict_order(task, action_id) {
                return ActionBlockReason::OutOfOrder;
            }
            if self.is_blocked_by_dependencies(task, action) {
                return ActionBlockReason::OutOfOrder;
            }
            ActionBlockReason::None
        })
    }

    /// The strict order names a different action.
    pub fn is_blocked_by_strict_order(&self, task: &Task, action_id: &str) -> bool {
        self.next_action_id_in_strict_order(task).is_some_and(|next| next != action_id)
    }

    /// Some other pending action is one `action` must wait for.
    pub fn is_blocked_by_dependencies(&self, task: &Task, action: &PlannedAction) -> bool {
        self.flags.get_or_compute(cache_key("dependency_blocked", task, &[&action.id]), || {
            task.planned_actions.iter().any(|other| {
                other.id != action.id
                    && other.is_pending()
                    && self.dependencies.can_be_executed_after(action, other)
            })
        })
    }

    /// Drops every cached answer, including the initial validator's.
    pub fn clear_cache(&self) {
        self.initial.clear_cache();
        self.flags.clear();
        self.ids.clear();
        self.reasons.clear();
    }
}
