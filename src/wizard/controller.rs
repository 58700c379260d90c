//! Facade used by front ends.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use super::adapter::{ActionWizardState, FsmWizardAdapter};
use crate::error::WizardError;
use crate::model::{StepValue, Task};
use crate::session::TaskSession;

/// One operator input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardInput {
    /// A scanned barcode.
    Scan(String),
    /// A counted quantity.
    Quantity(f64),
    /// Return to the previous step.
    Back,
    /// Leave the current step empty.
    Skip,
    /// Accept the value already held by the current step.
    Confirm,
    /// Record the fact.
    Complete,
    /// Abandon the wizard.
    Cancel,
}

/// Entry points for driving the wizard of the active task.
pub struct ActionWizardController {
    adapter: Arc<FsmWizardAdapter>,
    session: Arc<TaskSession>,
}

impl ActionWizardController {
    /// Wraps `adapter`, which must share `session`.
    #[must_use]
    pub fn new(adapter: Arc<FsmWizardAdapter>, session: Arc<TaskSession>) -> Self {
        Self { adapter, session }
    }

    /// Starts the wizard for a given action.
    ///
    /// # Errors
    ///
    /// See [`FsmWizardAdapter::initialize`].
    pub async fn start(
        &self,
        task_id: &str,
        action_id: &str,
    ) -> Result<ActionWizardState, WizardError> {
        self.adapter.initialize(task_id, action_id).await
    }

    /// Starts the wizard for the next action in strict order.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::InvalidState`] when every action is done, or
    /// the errors of [`FsmWizardAdapter::initialize`].
    pub async fn start_next(&self, task_id: &str) -> Result<ActionWizardState, WizardError> {
        let task = self.session.require_task(task_id)?;
        let Some(action_id) = self.adapter.validator().next_action_id_in_strict_order(&task) else {
            return Err(WizardError::InvalidState {
                operation: "start the next action",
                state: "all actions done",
            });
        };
        info!(task_id, action_id = %action_id, "starting next action");
        self.adapter.initialize(task_id, &action_id).await
    }

    /// Applies one operator input.
    ///
    /// # Errors
    ///
    /// Returns the error of the adapter operation the input maps to.
    pub async fn handle(&self, input: &WizardInput) -> Result<ActionWizardState, WizardError> {
        match input {
            WizardInput::Scan(code) => self.adapter.process_barcode_from_scanner(code).await,
            WizardInput::Quantity(quantity) => self.adapter.process_quantity(*quantity).await,
            WizardInput::Back => self.adapter.navigate_back().await,
            WizardInput::Skip => self.adapter.process_step_result(None).await,
            WizardInput::Confirm => self.adapter.process_forward_step().await,
            WizardInput::Complete => self.adapter.complete().await,
            WizardInput::Cancel => self.adapter.cancel().await,
        }
    }

    /// Offers a typed value for the current step.
    ///
    /// # Errors
    ///
    /// See [`FsmWizardAdapter::process_step_result`].
    pub async fn submit(&self, value: StepValue) -> Result<ActionWizardState, WizardError> {
        self.adapter.process_step_result(Some(value)).await
    }

    /// Skips a whole action.
    ///
    /// # Errors
    ///
    /// See [`FsmWizardAdapter::skip_action`].
    pub async fn skip_action(&self, task_id: &str, action_id: &str) -> Result<Task, WizardError> {
        self.adapter.skip_action(task_id, action_id).await
    }

    /// Marks a whole action done without running its wizard.
    ///
    /// # Errors
    ///
    /// See [`FsmWizardAdapter::complete_action_manually`].
    pub async fn complete_action_manually(
        &self,
        task_id: &str,
        action_id: &str,
    ) -> Result<Task, WizardError> {
        self.adapter.complete_action_manually(task_id, action_id).await
    }

    /// Latest wizard snapshot.
    #[must_use]
    pub fn state(&self) -> ActionWizardState {
        self.adapter.state()
    }

    /// Subscribes to wizard snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ActionWizardState> {
        self.adapter.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_read_from_yaml() {
        let script = r#"
- scan: "4600000000017"
- quantity: 2.5
- back
- skip
- confirm
- complete
- cancel
"#;
        let inputs: Vec<WizardInput> = serde_yaml::from_str(script).unwrap();
        assert_eq!(
            inputs,
            vec![
                WizardInput::Scan("4600000000017".into()),
                WizardInput::Quantity(2.5),
                WizardInput::Back,
                WizardInput::Skip,
                WizardInput::Confirm,
                WizardInput::Complete,
                WizardInput::Cancel,
            ]
        );
    }
}
