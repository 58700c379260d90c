//! The active task held for the current device session.
//!
//! A [`TaskSession`] is the single owner of the task being executed and its
//! task type. Services receive it explicitly (as an `Arc`) and never mutate
//! the task in place: they clone, change the clone and hand the whole task
//! back through [`TaskSession::update_task`], so readers always see a
//! consistent snapshot.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::WizardError;
use crate::model::{Task, TaskType};
use crate::ports::TaskRepository;

/// Observable holder of the active task and its task type.
pub struct TaskSession {
    task: watch::Sender<Option<Task>>,
    task_type: watch::Sender<Option<TaskType>>,
}

impl Default for TaskSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self { task: watch::channel(None).0, task_type: watch::channel(None).0 }
    }

    /// Makes `task` the active task.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::InvalidPlan`] if the plan breaks an invariant;
    /// the session is left unchanged.
    pub fn set_task(&self, task: Task, task_type: Option<TaskType>) -> Result<(), WizardError> {
        task.check_plan()?;
        info!(task_id = %task.id, actions = task.planned_actions.len(), "task activated");
        self.task.send_replace(Some(task));
        self.task_type.send_replace(task_type);
        Ok(())
    }

    /// Fetches a task and its type from the repository and activates it.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::TaskNotFound`] for an unknown id,
    /// [`WizardError::Port`] if the repository fails, or
    /// [`WizardError::InvalidPlan`] if the plan is malformed.
    pub async fn load(
        &self,
        repository: &dyn TaskRepository,
        task_id: &str,
    ) -> Result<Task, WizardError> {
        let task = repository
            .get_task_by_id(task_id)
            .await
            .map_err(|e| WizardError::Port(format!("Failed to load task {task_id}: {e}")))?
            .ok_or_else(|| WizardError::TaskNotFound(task_id.to_string()))?;

        let task_type = match &task.task_type_id {
            Some(type_id) => repository.get_task_type(type_id).await.map_err(|e| {
                WizardError::Port(format!("Failed to load task type {type_id}: {e}"))
            })?,
            None => None,
        };

        self.set_task(task.clone(), task_type)?;
        Ok(task)
    }

    /// Snapshot of the active task.
    #[must_use]
    pub fn current_task(&self) -> Option<Task> {
        self.task.borrow().clone()
    }

    /// Snapshot of the active task's type.
    #[must_use]
    pub fn current_task_type(&self) -> Option<TaskType> {
        self.task_type.borrow().clone()
    }

    /// Returns the active task, checking that it is `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoActiveTask`] or [`WizardError::TaskMismatch`].
    pub fn require_task(&self, task_id: &str) -> Result<Task, WizardError> {
        let task = self.current_task().ok_or(WizardError::NoActiveTask)?;
        if task.id != task_id {
            return Err(WizardError::TaskMismatch {
                active: task.id,
                requested: task_id.to_string(),
            });
        }
        Ok(task)
    }

    /// Replaces the active task with a new version.
    ///
    /// Subscribers are only notified when the task actually changed.
    pub fn update_task(&self, task: Task) {
        debug!(task_id = %task.id, modified = %task.last_modified_at, "task updated");
        self.task.send_if_modified(|current| {
            if current.as_ref() == Some(&task) {
                false
            } else {
                *current = Some(task);
                true
            }
        });
    }

    /// Forgets the active task and its type.
    pub fn clear_context(&self) {
        debug!("task context cleared");
        self.task.send_replace(None);
        self.task_type.send_replace(None);
    }

    /// Subscribes to changes of the active task.
    #[must_use]
    pub fn subscribe_task(&self) -> watch::Receiver<Option<Task>> {
        self.task.subscribe()
    }

    /// Subscribes to changes of the active task type.
    #[must_use]
    pub fn subscribe_task_type(&self) -> watch::Receiver<Option<TaskType>> {
        self.task_type.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{action, put_task, task_with};

    #[test]
    fn require_task_checks_identity() {
        let session = TaskSession::new();
        assert_eq!(session.require_task("T1"), Err(WizardError::NoActiveTask));

        session.set_task(put_task(), None).unwrap();
        assert!(session.require_task("T1").is_ok());
        assert!(matches!(session.require_task("T2"), Err(WizardError::TaskMismatch { .. })));
    }

    #[test]
    fn set_task_rejects_duplicate_orders() {
        let session = TaskSession::new();
        let task = task_with(vec![action("a", 1), action("b", 1)]);
        assert!(matches!(session.set_task(task, None), Err(WizardError::InvalidPlan(_))));
        assert!(session.current_task().is_none());
    }

    #[test]
    fn update_notifies_only_on_change() {
        let session = TaskSession::new();
        session.set_task(put_task(), None).unwrap();
        let mut rx = session.subscribe_task();
        rx.mark_unchanged();

        session.update_task(put_task());
        assert!(!rx.has_changed().unwrap());

        let mut changed = put_task();
        changed.name = "Renamed".into();
        session.update_task(changed);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn clear_context_forgets_everything() {
        let session = TaskSession::new();
        session.set_task(put_task(), None).unwrap();
        session.clear_context();
        assert!(session.current_task().is_none());
        assert!(session.current_task_type().is_none());
    }
}
