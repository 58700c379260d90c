//! Records the outcome of a planned action.
//!
//! Completing a wizard turns its role-tagged step results into a
//! [`FactAction`], persists it through the task repository and writes the
//! updated task back to the session. Skipping and manual completion change
//! the planned action without recording a fact.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::WizardError;
use crate::model::{
    BinX, FactAction, Pallet, PlannedAction, StepResult, StepRole, StepValue, Task, TaskProduct,
    TaskStatus,
};
use crate::ports::{Clock, IdGenerator, TaskRepository};
use crate::session::TaskSession;

/// Applies action outcomes to the active task.
pub struct ActionExecutionService {
    session: Arc<TaskSession>,
    tasks: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ActionExecutionService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        session: Arc<TaskSession>,
        tasks: Arc<dyn TaskRepository>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { session, tasks, clock, ids }
    }

    /// Records a fact for `action_id` built from `results` and marks the
    /// action completed.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoActiveTask`] or [`WizardError::TaskMismatch`]
    /// when the session does not hold `task_id`,
    /// [`WizardError::ActionNotFound`] for an unknown action,
    /// [`WizardError::ActionAlreadyCompleted`] if a fact already exists, or
    /// [`WizardError::Port`] if the repository rejects the fact.
    pub async fn execute_action(
        &self,
        task_id: &str,
        action_id: &str,
        results: &[StepResult],
        started_at: DateTime<Utc>,
    ) -> Result<Task, WizardError> {
        let mut task = self.session.require_task(task_id)?;
        let action = task
            .find_action(action_id)
            .ok_or_else(|| WizardError::ActionNotFound(action_id.to_string()))?;
        if action.is_completed {
            return Err(WizardError::ActionAlreadyCompleted(action_id.to_string()));
        }

        let now = self.clock.now();
        let fact = build_fact(self.ids.generate_id(), task_id, action, results, started_at, now);

        self.tasks.add_fact_action(task_id, &fact).await.map_err(|e| {
            warn!(task_id, action_id, error = %e, "failed to persist fact");
            WizardError::Port(format!("Failed to save fact for action {action_id}: {e}"))
        })?;

        if let Some(action) = task.find_action_mut(action_id) {
            action.is_completed = true;
            action.is_skipped = false;
        }
        info!(task_id, action_id, fact_id = %fact.id, "fact recorded");
        task.fact_actions.push(fact);
        if task.status == TaskStatus::ToDo {
            task.status = TaskStatus::InProgress;
        }
        task.touch(now);
        self.session.update_task(task.clone());
        Ok(task)
    }

    /// Marks `action_id` skipped without recording a fact.
    ///
    /// # Errors
    ///
    /// Returns the session errors of [`Self::execute_action`],
    /// [`WizardError::ActionNotFound`], or
    /// [`WizardError::ActionAlreadyCompleted`] for a completed action.
    pub fn skip_action(&self, task_id: &str, action_id: &str) -> Result<Task, WizardError> {
        self.mark(task_id, action_id, |action| action.is_skipped = true)
    }

    /// Marks `action_id` completed by hand, without recording a fact.
    ///
    /// # Errors
    ///
    /// Same as [`Self::skip_action`].
    pub fn complete_action_manually(
        &self,
        task_id: &str,
        action_id: &str,
    ) -> Result<Task, WizardError> {
        self.mark(task_id, action_id, |action| {
            action.is_completed = true;
            action.manually_completed = true;
            action.is_skipped = false;
        })
    }

    fn mark(
        &self,
        task_id: &str,
        action_id: &str,
        apply: impl FnOnce(&mut PlannedAction),
    ) -> Result<Task, WizardError> {
        let mut task = self.session.require_task(task_id)?;
        let action = task
            .find_action_mut(action_id)
            .ok_or_else(|| WizardError::ActionNotFound(action_id.to_string()))?;
        if action.is_completed {
            return Err(WizardError::ActionAlreadyCompleted(action_id.to_string()));
        }
        apply(action);
        info!(task_id, action_id, skipped = action.is_skipped, "action closed without a fact");
        task.touch(self.clock.now());
        self.session.update_task(task.clone());
        Ok(task)
    }
}

/// Builds the fact for `action` from role-tagged step results.
///
/// The first product becomes the storage product and a later product from
/// a placement step the placement product. Pallets and bins go to the side
/// Pallets go to the side named by their role; pallets without a role fill
/// the storage side first and then the placement side with the next distinct
/// pallet. The first bin is always the placement bin, whatever its role.
/// Facts never carry a storage bin.
fn build_fact(
    id: String,
    task_id: &str,
    action: &PlannedAction,
    results: &[StepResult],
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> FactAction {
    let mut storage_product: Option<TaskProduct> = None;
    let mut placement_product: Option<TaskProduct> = None;
    let mut storage_pallet: Option<Pallet> = None;
    let mut placement_pallet: Option<Pallet> = None;
    let mut loose_pallets: Vec<Pallet> = Vec::new();
    let mut placement_bin: Option<BinX> = None;

    for result in results {
        let product = match &result.value {
            StepValue::Product(product) => Some(TaskProduct::from_product(product.clone())),
            StepValue::TaskProduct(product) => Some(product.clone()),
            _ => None,
        };
        if let Some(product) = product {
            if storage_product.is_none() {
                storage_product = Some(product);
            } else if result.role == StepRole::Placement && placement_product.is_none() {
                placement_product = Some(product);
            }
            continue;
        }

        match &result.value {
            StepValue::Pallet(pallet) => match result.role {
                StepRole::Storage => {
                    storage_pallet.get_or_insert_with(|| pallet.clone());
                }
                StepRole::Placement => {
                    placement_pallet.get_or_insert_with(|| pallet.clone());
                }
                StepRole::Unassigned => loose_pallets.push(pallet.clone()),
            },
            StepValue::Bin(bin) => {
                placement_bin.get_or_insert_with(|| bin.clone());
            }
            _ => {}
        }
    }

    for pallet in loose_pallets {
        if storage_pallet.is_none() {
            storage_pallet = Some(pallet);
        } else if placement_pallet.is_none() && storage_pallet.as_ref() != Some(&pallet) {
            placement_pallet = Some(pallet);
        }
    }

    FactAction {
        id,
        task_id: task_id.to_string(),
        planned_action_id: action.id.clone(),
        wms_action: action.wms_action,
        storage_product,
        placement_product,
        storage_pallet,
        placement_pallet,
        storage_bin: None,
        placement_bin,
        started_at,
        completed_at,
    }
}
