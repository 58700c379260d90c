//! Data carried through a wizard run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{ActionStep, StepResult};

/// Everything the wizard has collected so far. Replaced, never mutated in
/// place, on every transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardContext {
    /// Task the action belongs to.
    pub task_id: String,
    /// Planned action being executed.
    pub action_id: String,
    /// Steps in execution order.
    pub steps: Vec<ActionStep>,
    /// Accepted values keyed by step id.
    pub results: BTreeMap<String, StepResult>,
    /// Last barcode seen on the current step, for de-duplication.
    pub last_scanned_barcode: Option<String>,
    /// Validation message for the current step.
    pub step_error: Option<String>,
    /// When the wizard was started.
    pub started_at: Option<DateTime<Utc>>,
}

impl WizardContext {
    /// Creates a fresh context for an action.
    #[must_use]
    pub fn new(
        task_id: impl Into<String>,
        action_id: impl Into<String>,
        steps: Vec<ActionStep>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            action_id: action_id.into(),
            steps,
            started_at: Some(started_at),
            ..Self::default()
        }
    }

    /// An empty context, used before initialization and after a reset.
    #[must_use]
    pub fn blank() -> Self {
        Self::default()
    }

    /// Number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// The step at `index`.
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&ActionStep> {
        self.steps.get(index)
    }

    /// The accepted value of a step.
    #[must_use]
    pub fn result_for(&self, step_id: &str) -> Option<&StepResult> {
        self.results.get(step_id)
    }

    /// Accepted values in step order.
    #[must_use]
    pub fn ordered_results(&self) -> Vec<StepResult> {
        self.steps.iter().filter_map(|step| self.results.get(&step.id).cloned()).collect()
    }
}
