//! The task aggregate.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::action::{FactAction, PlannedAction};
use super::step::ActionObjectType;
use crate::error::WizardError;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    ToDo,
    /// At least one fact recorded.
    InProgress,
    /// Put aside by the operator.
    Paused,
    /// Finished.
    Completed,
    /// Abandoned.
    Cancelled,
}

/// Metadata shared by all tasks of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskType {
    /// Task type identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Object types kept in the auto-fill buffer. Empty means all.
    #[serde(default)]
    pub savable_object_types: Vec<ActionObjectType>,
    /// Whether steps may be filled from the buffer.
    #[serde(default)]
    pub auto_fill_enabled: bool,
}

/// A warehouse task: the plan plus the facts recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Id of the task's [`TaskType`].
    #[serde(default)]
    pub task_type_id: Option<String>,
    /// Planned work.
    #[serde(default)]
    pub planned_actions: Vec<PlannedAction>,
    /// Recorded outcomes.
    #[serde(default)]
    pub fact_actions: Vec<FactAction>,
    /// Bumped on every state-affecting mutation; part of validator cache keys.
    pub last_modified_at: DateTime<Utc>,
}

impl Task {
    /// Looks up a planned action by id.
    #[must_use]
    pub fn find_action(&self, action_id: &str) -> Option<&PlannedAction> {
        self.planned_actions.iter().find(|action| action.id == action_id)
    }

    /// Looks up a planned action by id for mutation.
    pub fn find_action_mut(&mut self, action_id: &str) -> Option<&mut PlannedAction> {
        self.planned_actions.iter_mut().find(|action| action.id == action_id)
    }

    /// Moves `last_modified_at` strictly forward.
    ///
    /// A clock that has not advanced since the previous mutation still
    /// yields a new stamp, one millisecond later.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.last_modified_at + Duration::milliseconds(1);
        self.last_modified_at = if now >= floor { now } else { floor };
    }

    /// Checks the structural invariants of the plan.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::InvalidPlan`] when two actions share an
    /// order or an action is both completed and skipped.
    pub fn check_plan(&self) -> Result<(), WizardError> {
        let mut orders = HashSet::new();
        for action in &self.planned_actions {
            if !orders.insert(action.order) {
                return Err(WizardError::InvalidPlan(format!(
                    "order {} is used by more than one action",
                    action.order
                )));
            }
            if action.is_completed && action.is_skipped {
                return Err(WizardError::InvalidPlan(format!(
                    "action {} is both completed and skipped",
                    action.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_task() -> Task {
        Task {
            id: "T1".into(),
            name: String::new(),
            status: TaskStatus::ToDo,
            task_type_id: None,
            planned_actions: Vec::new(),
            fact_actions: Vec::new(),
            last_modified_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn touch_moves_forward_with_a_stalled_clock() {
        let mut task = empty_task();
        let before = task.last_modified_at;
        task.touch(before);
        assert!(task.last_modified_at > before);
    }

    #[test]
    fn touch_uses_a_later_clock_value() {
        let mut task = empty_task();
        let later = task.last_modified_at + Duration::seconds(10);
        task.touch(later);
        assert_eq!(task.last_modified_at, later);
    }
}
