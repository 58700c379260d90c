//! Rules for the initial tier.

use super::cache::{cache_key, MemoCache};
use super::order;
use crate::model::{PlannedAction, Task};

fn is_initial(action: &PlannedAction) -> bool {
    action.is_initial_action
}

/// Answers questions about a task's initial actions.
#[derive(Debug, Default)]
pub struct InitialActionsValidator {
    flags: MemoCache<bool>,
    ids: MemoCache<Option<String>>,
}

impl InitialActionsValidator {
    /// Creates a validator with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every initial action is completed or skipped (vacuously true without any).
    pub fn are_initial_actions_completed(&self, task: &Task) -> bool {
        self.flags.get_or_compute(cache_key("initial_completed", task, &[]), || {
            order::all_completed(&task.planned_actions, is_initial)
        })
    }

    /// Id of the pending initial action with the lowest order.
    pub fn next_initial_action_id(&self, task: &Task) -> Option<String> {
        self.ids.get_or_compute(cache_key("initial_next", task, &[]), || {
            order::next_incomplete(&task.planned_actions, is_initial)
                .map(|action| action.id.clone())
        })
    }

    /// The task has at least one initial action.
    pub fn has_initial_actions(&self, task: &Task) -> bool {
        self.flags.get_or_compute(cache_key("initial_any", task, &[]), || {
            task.planned_actions.iter().any(is_initial)
        })
    }

    /// Whether the initial tier lets `action_id` run.
    ///
    /// True when the action is itself initial, when the task has no initial
    /// actions, or when every initial action is done.
    pub fn can_execute_regular_action(&self, task: &Task, action_id: &str) -> bool {
        self.flags.get_or_compute(cache_key("initial_allows", task, &[action_id]), || {
            task.find_action(action_id).is_some_and(is_initial)
                || !self.has_initial_actions(task)
                || self.are_initial_actions_completed(task)
        })
    }

    /// A lower-ordered initial action is still pending.
    ///
    /// Non-initial actions are never reported as out of order here.
    pub fn is_initial_action_out_of_order(&self, task: &Task, action_id: &str) -> bool {
        self.flags.get_or_compute(cache_key("initial_out_of_order", task, &[action_id]), || {
            order::is_out_of_order(&task.planned_actions, action_id, is_initial)
        })
    }

    /// Drops every cached answer.
    pub fn clear_cache(&self) {
        self.flags.clear();
        self.ids.clear();
    }

    /// Number of computations performed so far, for diagnostics.
    #[must_use]
    pub fn cache_misses(&self) -> u64 {
        self.flags.misses() + self.ids.misses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{action, completed, initial, task_with};

    #[test]
    fn regular_action_waits_for_initial_tier() {
        let validator = InitialActionsValidator::new();
        let task = task_with(vec![initial("i1", 1), action("r1", 2)]);

        assert!(validator.has_initial_actions(&task));
        assert!(!validator.are_initial_actions_completed(&task));
        assert!(!validator.can_execute_regular_action(&task, "r1"));
        assert!(validator.can_execute_regular_action(&task, "i1"));
        assert_eq!(validator.next_initial_action_id(&task).as_deref(), Some("i1"));
    }

    #[test]
    fn no_initial_actions_means_everything_may_run() {
        let validator = InitialActionsValidator::new();
        let task = task_with(vec![action("r1", 1)]);
        assert!(!validator.has_initial_actions(&task));
        assert!(validator.are_initial_actions_completed(&task));
        assert!(validator.can_execute_regular_action(&task, "r1"));
        assert!(validator.next_initial_action_id(&task).is_none());
    }

    #[test]
    fn initial_out_of_order_is_scoped_to_initial_tier() {
        let validator = InitialActionsValidator::new();
        let task = task_with(vec![initial("i1", 1), initial("i2", 2), action("r1", 0)]);
        assert!(validator.is_initial_action_out_of_order(&task, "i2"));
        assert!(!validator.is_initial_action_out_of_order(&task, "i1"));
        assert!(!validator.is_initial_action_out_of_order(&task, "r1"));
    }

    #[test]
    fn repeated_queries_hit_the_cache_until_the_task_is_touched() {
        let validator = InitialActionsValidator::new();
        let mut task = task_with(vec![initial("i1", 1), action("r1", 2)]);

        assert!(!validator.are_initial_actions_completed(&task));
        assert!(!validator.are_initial_actions_completed(&task));
        assert_eq!(validator.cache_misses(), 1);

        task.planned_actions[0] = completed(task.planned_actions[0].clone());
        // Same stamp: the stale answer is still served.
        assert!(!validator.are_initial_actions_completed(&task));

        let now = task.last_modified_at;
        task.touch(now);
        assert!(validator.are_initial_actions_completed(&task));
        assert_eq!(validator.cache_misses(), 2);
    }
}
