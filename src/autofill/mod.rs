//! Buffer of values carried between steps and actions.
//!
//! Steps flagged `save_to_buffer` leave their accepted value here; later
//! steps flagged `auto_fill` can take it back instead of asking the
//! operator to scan the same object again.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ActionObjectType, ActionStep, StepValue, TaskType};
use crate::ports::Clock;

/// A value kept in the auto-fill buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavableObject {
    /// The saved value.
    pub value: StepValue,
    /// Step that produced it.
    pub source_step_id: String,
    /// Object type of the source step.
    pub object_type: ActionObjectType,
    /// When it was saved.
    pub saved_at: DateTime<Utc>,
}

/// Returns `true` when a value collected for `saved` may fill a step of type `wanted`.
///
/// Classifier and task products stand in for each other; everything else
/// must match exactly.
#[must_use]
pub fn is_compatible(saved: ActionObjectType, wanted: ActionObjectType) -> bool {
    use ActionObjectType::{ClassifierProduct, TaskProduct};
    saved == wanted
        || matches!(
            (saved, wanted),
            (ClassifierProduct, TaskProduct) | (TaskProduct, ClassifierProduct)
        )
}

/// Holds at most one saved object per object type.
pub struct AutoFillManager {
    clock: Arc<dyn Clock>,
    buffer: Mutex<Vec<SavableObject>>,
}

impl AutoFillManager {
    /// Creates an empty buffer stamping entries with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, buffer: Mutex::new(Vec::new()) }
    }

    /// Saves `value` if `step` asks for it and the task type keeps its object type.
    ///
    /// Returns whether the value was saved. A newer value replaces the
    /// previous one of the same object type.
    pub fn remember(
        &self,
        step: &ActionStep,
        value: &StepValue,
        task_type: Option<&TaskType>,
    ) -> bool {
        if !step.save_to_buffer || !is_savable(step.object_type, task_type) {
            return false;
        }
        let object = SavableObject {
            value: value.clone(),
            source_step_id: step.id.clone(),
            object_type: step.object_type,
            saved_at: self.clock.now(),
        };
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.retain(|saved| saved.object_type != step.object_type);
        buffer.push(object);
        debug!(step_id = %step.id, object_type = %step.object_type, "value buffered");
        true
    }

    /// Returns the most recently saved value usable for `step`, if the step
    /// and the task type allow auto-fill.
    #[must_use]
    pub fn auto_fill_value(
        &self,
        step: &ActionStep,
        task_type: Option<&TaskType>,
    ) -> Option<StepValue> {
        if !step.auto_fill || task_type.is_some_and(|t| !t.auto_fill_enabled) {
            return None;
        }
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer
            .iter()
            .rev()
            .find(|saved| is_compatible(saved.object_type, step.object_type))
            .map(|saved| saved.value.clone())
    }

    /// Returns `true` when `step` can be passed using a buffered value.
    #[must_use]
    pub fn should_auto_skip(&self, step: &ActionStep, task_type: Option<&TaskType>) -> bool {
        self.auto_fill_value(step, task_type).is_some()
    }

    /// Snapshot of the buffer, oldest first.
    #[must_use]
    pub fn objects(&self) -> Vec<SavableObject> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Empties the buffer.
    pub fn clear(&self) {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

fn is_savable(object_type: ActionObjectType, task_type: Option<&TaskType>) -> bool {
    task_type.is_none_or(|t| {
        t.savable_object_types.is_empty() || t.savable_object_types.contains(&object_type)
    })
}
