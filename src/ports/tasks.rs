//! Task repository port.

use super::PortFuture;
use crate::model::{FactAction, Task, TaskType};

/// Loads tasks and persists recorded facts.
pub trait TaskRepository: Send + Sync {
    /// Fetches a task type.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    fn get_task_type(&self, id: &str) -> PortFuture<'_, Option<TaskType>>;

    /// Fetches a task with its planned and recorded actions.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    fn get_task_by_id(&self, id: &str) -> PortFuture<'_, Option<Task>>;

    /// Persists a fact recorded for a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is unknown or the fact cannot be stored.
    fn add_fact_action(&self, task_id: &str, fact: &FactAction) -> PortFuture<'_, ()>;
}
