//! Imperative wizard API on top of the state machine.
//!
//! [`FsmWizardAdapter`] turns operator input (scans, typed quantities,
//! confirmations, navigation) into step executions and FSM events, and
//! republishes every FSM state as an [`ActionWizardState`] snapshot.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::context::WizardContext;
use super::machine::WizardStateMachine;
use super::state::{WizardEvent, WizardState};
use crate::autofill::AutoFillManager;
use crate::context::ServiceContext;
use crate::error::WizardError;
use crate::execution::ActionExecutionService;
use crate::model::{
    ActionObjectType, ActionStep, StepResult, StepValue, Task, TaskProduct,
};
use crate::ports::{BinRepository, Clock, PalletRepository, PortError, ProductRepository};
use crate::session::TaskSession;
use crate::step::{ActionStepExecutionService, StepExecutionResult};
use crate::validators::FinalActionsValidator;

/// Coarse position of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    /// No action loaded.
    Idle,
    /// Collecting a step.
    Step,
    /// All steps collected; waiting for completion.
    Completing,
    /// Fact recorded.
    Completed,
    /// Abandoned.
    Cancelled,
    /// Failed to start or to record the fact.
    Error,
}

/// Snapshot of the wizard for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionWizardState {
    /// Where the wizard is.
    pub phase: WizardPhase,
    /// Task being worked on.
    pub task_id: String,
    /// Action being executed.
    pub action_id: String,
    /// Steps in execution order.
    pub steps: Vec<ActionStep>,
    /// Index of the step being collected.
    pub current_step_index: Option<usize>,
    /// Accepted values in step order.
    pub results: Vec<StepResult>,
    /// Fraction of steps done.
    pub progress: f64,
    /// Whether going back is possible.
    pub can_go_back: bool,
    /// Last barcode scanned on the current step.
    pub last_scanned_barcode: Option<String>,
    /// Validation message for the current step.
    pub step_error: Option<String>,
    /// Failure message of the error phase.
    pub error: Option<String>,
}

impl ActionWizardState {
    /// The step being collected.
    #[must_use]
    pub fn current_step(&self) -> Option<&ActionStep> {
        self.current_step_index.and_then(|index| self.steps.get(index))
    }
}

impl Default for ActionWizardState {
    fn default() -> Self {
        Self::from(&WizardState::default())
    }
}

impl From<&WizardState> for ActionWizardState {
    fn from(state: &WizardState) -> Self {
        let context = state.context();
        let (phase, error) = match state {
            WizardState::Initializing { .. } => (WizardPhase::Idle, None),
            WizardState::Step { .. } => (WizardPhase::Step, None),
            WizardState::Completing { .. } => (WizardPhase::Completing, None),
            WizardState::Completed { .. } => (WizardPhase::Completed, None),
            WizardState::Cancelled { .. } => (WizardPhase::Cancelled, None),
            WizardState::Error { message, .. } => (WizardPhase::Error, Some(message.clone())),
        };
        Self {
            phase,
            task_id: context.task_id.clone(),
            action_id: context.action_id.clone(),
            steps: context.steps.clone(),
            current_step_index: state.step_index(),
            results: context.ordered_results(),
            progress: state.progress(),
            can_go_back: state.can_go_back(),
            last_scanned_barcode: context.last_scanned_barcode.clone(),
            step_error: context.step_error.clone(),
            error,
        }
    }
}

/// Drives one wizard at a time for the task held by the session.
pub struct FsmWizardAdapter {
    session: Arc<TaskSession>,
    validator: Arc<FinalActionsValidator>,
    steps: ActionStepExecutionService,
    execution: ActionExecutionService,
    autofill: Arc<AutoFillManager>,
    products: Arc<dyn ProductRepository>,
    bins: Arc<dyn BinRepository>,
    pallets: Arc<dyn PalletRepository>,
    clock: Arc<dyn Clock>,
    machine: WizardStateMachine,
    published: Arc<watch::Sender<ActionWizardState>>,
    observer: Mutex<Option<JoinHandle<()>>>,
    context_watch: JoinHandle<()>,
}

impl FsmWizardAdapter {
    /// Wires the adapter to the ports of `ctx`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(
        ctx: &ServiceContext,
        session: Arc<TaskSession>,
        validator: Arc<FinalActionsValidator>,
    ) -> Self {
        let autofill = Arc::new(AutoFillManager::new(Arc::clone(&ctx.clock)));
        Self {
            context_watch: watch_context(&session, Arc::clone(&autofill)),
            steps: ActionStepExecutionService::new(Arc::clone(&session), ctx.validation_service()),
            execution: ActionExecutionService::new(
                Arc::clone(&session),
                Arc::clone(&ctx.tasks),
                Arc::clone(&ctx.clock),
                Arc::clone(&ctx.id_gen),
            ),
            autofill,
            products: Arc::clone(&ctx.products),
            bins: Arc::clone(&ctx.bins),
            pallets: Arc::clone(&ctx.pallets),
            clock: Arc::clone(&ctx.clock),
            machine: WizardStateMachine::spawn(),
            published: Arc::new(watch::channel(ActionWizardState::default()).0),
            observer: Mutex::new(None),
            session,
            validator,
        }
    }

    /// Starts the wizard for `action_id` of the active task.
    ///
    /// Any wizard in progress is discarded. Steps that can be filled from
    /// the buffer are passed immediately.
    ///
    /// # Errors
    ///
    /// Returns session errors, [`WizardError::ActionNotFound`],
    /// [`WizardError::ActionAlreadyCompleted`],
    /// [`WizardError::ActionBlocked`] when ordering rules forbid the action,
    /// or [`WizardError::NoSteps`] for an empty template (the wizard is
    /// then in its error phase).
    pub async fn initialize(
        &self,
        task_id: &str,
        action_id: &str,
    ) -> Result<ActionWizardState, WizardError> {
        let task = self.session.require_task(task_id)?;
        let action = task
            .find_action(action_id)
            .ok_or_else(|| WizardError::ActionNotFound(action_id.to_string()))?;
        if action.is_completed {
            return Err(WizardError::ActionAlreadyCompleted(action_id.to_string()));
        }
        let reason = self.validator.action_block_reason(&task, action_id);
        if reason.is_blocked() {
            warn!(task_id, action_id, %reason, "action is blocked");
            return Err(WizardError::ActionBlocked { action_id: action_id.to_string(), reason });
        }

        self.stop_observer();
        self.machine.reset().await?;
        self.start_observer();

        let steps = action.action_template.wizard_steps();
        info!(task_id, action_id, steps = steps.len(), "wizard started");
        let context = WizardContext::new(task_id, action_id, steps, self.clock.now());
        let outcome = self.machine.send(WizardEvent::Initialize { context }).await?;
        if matches!(outcome.state, WizardState::Error { .. }) {
            self.publish(&outcome.state);
            return Err(WizardError::NoSteps(action_id.to_string()));
        }
        let state = self.auto_fill(outcome.state).await?;
        Ok(self.publish(&state))
    }

    /// Offers `value` for the current step; `None` asks to skip it.
    ///
    /// An accepted value advances the wizard; a rejected one stays on the
    /// step with its message in `step_error`.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::InvalidState`] outside a step, or session
    /// errors if the task changed underneath the wizard.
    pub async fn process_step_result(
        &self,
        value: Option<StepValue>,
    ) -> Result<ActionWizardState, WizardError> {
        let (index, context) = self.current_step("accept a step value")?;
        let event = self.evaluate(index, &context, value).await?;
        let advanced = matches!(event, WizardEvent::Next { .. });
        let outcome = self.machine.send(event).await?;
        let state = if advanced { self.auto_fill(outcome.state).await? } else { outcome.state };
        Ok(self.publish(&state))
    }

    /// Re-submits the value already held for the current step, or nothing if
    /// there is none. Confirms a step revisited with [`Self::navigate_back`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::process_step_result`].
    pub async fn process_forward_step(&self) -> Result<ActionWizardState, WizardError> {
        let (index, context) = self.current_step("confirm a step")?;
        let value = context
            .step(index)
            .and_then(|step| context.result_for(&step.id))
            .map(|result| result.value.clone());
        self.process_step_result(value).await
    }

    /// Handles a scanned barcode on the current step.
    ///
    /// A repeat of the previous scan is ignored. Otherwise the code is
    /// resolved through the repository matching the step's object type and
    /// the resulting object is offered as the step value.
    ///
    /// # Errors
    ///
    /// Same as [`Self::process_step_result`].
    pub async fn process_barcode_from_scanner(
        &self,
        barcode: &str,
    ) -> Result<ActionWizardState, WizardError> {
        let (index, context) = self.current_step("process a barcode")?;
        let Some(object_type) = context.step(index).map(|step| step.object_type) else {
            return Err(WizardError::InvalidState { operation: "process a barcode", state: "step" });
        };

        let outcome =
            self.machine.send(WizardEvent::ProcessBarcode { barcode: barcode.to_string() }).await?;
        if !outcome.applied {
            debug!(barcode, "repeated barcode ignored");
            return Ok(self.publish(&outcome.state));
        }

        let message = match self.resolve_barcode(object_type, barcode).await {
            Ok(Some(value)) => return self.process_step_result(Some(value)).await,
            Ok(None) => format!("Nothing found for barcode {barcode}"),
            Err(e) => {
                warn!(barcode, error = %e, "barcode lookup failed");
                e.to_string()
            }
        };
        let outcome = self.machine.send(WizardEvent::Reject { message }).await?;
        Ok(self.publish(&outcome.state))
    }

    /// Enters a counted quantity on the current step.
    ///
    /// The quantity applies to the product collected earlier in the wizard,
    /// or to the action's planned product when none was collected.
    ///
    /// # Errors
    ///
    /// Same as [`Self::process_step_result`].
    pub async fn process_quantity(&self, quantity: f64) -> Result<ActionWizardState, WizardError> {
        let (index, context) = self.current_step("enter a quantity")?;
        let object_type = context.step(index).map(|step| step.object_type);
        if object_type != Some(ActionObjectType::ProductQuantity) {
            return self.process_step_result(Some(StepValue::Quantity(quantity))).await;
        }
        match self.counted_product(&context) {
            Some(product) => {
                let counted = StepValue::TaskProduct(product.with_quantity(quantity));
                self.process_step_result(Some(counted)).await
            }
            None => {
                let message = "Scan a product before entering a quantity".to_string();
                let outcome = self.machine.send(WizardEvent::Reject { message }).await?;
                Ok(self.publish(&outcome.state))
            }
        }
    }

    /// Returns to the previous step if the current one allows it.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::MachineStopped`] if the state machine is gone.
    pub async fn navigate_back(&self) -> Result<ActionWizardState, WizardError> {
        let outcome = self.machine.send(WizardEvent::Back).await?;
        Ok(self.publish(&outcome.state))
    }

    /// Abandons the wizard.
    ///
    /// Publishes the cancelled state, stops republishing, resets the
    /// machine and empties the auto-fill buffer.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::MachineStopped`] if the state machine is gone.
    pub async fn cancel(&self) -> Result<ActionWizardState, WizardError> {
        let outcome = self.machine.send(WizardEvent::Cancel).await?;
        let state = self.publish(&outcome.state);
        self.stop_observer();
        self.machine.reset().await?;
        self.autofill.clear();
        info!(action_id = %state.action_id, "wizard cancelled");
        Ok(state)
    }

    /// Records the fact for the collected steps and finishes the wizard.
    ///
    /// The auto-fill buffer is emptied once the fact is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::InvalidState`] before every step is done, or
    /// the error of [`ActionExecutionService::execute_action`]; in that case
    /// the wizard moves to its error phase.
    pub async fn complete(&self) -> Result<ActionWizardState, WizardError> {
        let state = self.machine.state();
        if !state.is_completed() || matches!(state, WizardState::Completed { .. }) {
            return Err(WizardError::InvalidState { operation: "complete", state: state.name() });
        }
        let context = state.context();
        let started_at = context.started_at.unwrap_or_else(|| self.clock.now());
        let recorded = self
            .execution
            .execute_action(
                &context.task_id,
                &context.action_id,
                &context.ordered_results(),
                started_at,
            )
            .await;

        match recorded {
            Ok(_) => {
                let outcome = self.machine.send(WizardEvent::Complete).await?;
                self.autofill.clear();
                info!(
                    task_id = %context.task_id,
                    action_id = %context.action_id,
                    "wizard completed"
                );
                Ok(self.publish(&outcome.state))
            }
            Err(e) => {
                warn!(action_id = %context.action_id, error = %e, "wizard completion failed");
                let outcome =
                    self.machine.send(WizardEvent::Fail { message: e.to_string() }).await?;
                self.publish(&outcome.state);
                Err(e)
            }
        }
    }

    /// Skips `action_id` without recording a fact, cancelling its wizard if
    /// it is the one running.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ActionExecutionService::skip_action`].
    pub async fn skip_action(&self, task_id: &str, action_id: &str) -> Result<Task, WizardError> {
        let task = self.execution.skip_action(task_id, action_id)?;
        self.cancel_if_running(action_id).await?;
        Ok(task)
    }

    /// Marks `action_id` completed without recording a fact, cancelling its
    /// wizard if it is the one running.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ActionExecutionService::complete_action_manually`].
    pub async fn complete_action_manually(
        &self,
        task_id: &str,
        action_id: &str,
    ) -> Result<Task, WizardError> {
        let task = self.execution.complete_action_manually(task_id, action_id)?;
        self.cancel_if_running(action_id).await?;
        Ok(task)
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn state(&self) -> ActionWizardState {
        self.published.borrow().clone()
    }

    /// Subscribes to snapshots; only distinct snapshots are delivered.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ActionWizardState> {
        self.published.subscribe()
    }

    /// Validator used for ordering checks.
    #[must_use]
    pub fn validator(&self) -> &FinalActionsValidator {
        &self.validator
    }

    /// The auto-fill buffer.
    #[must_use]
    pub fn autofill(&self) -> &AutoFillManager {
        &self.autofill
    }

    fn current_step(&self, operation: &'static str) -> Result<(usize, WizardContext), WizardError> {
        match self.machine.state() {
            WizardState::Step { index, context } => Ok((index, context)),
            other => Err(WizardError::InvalidState { operation, state: other.name() }),
        }
    }

    /// Runs the step and returns the event describing the outcome.
    async fn evaluate(
        &self,
        index: usize,
        context: &WizardContext,
        value: Option<StepValue>,
    ) -> Result<WizardEvent, WizardError> {
        let step = context
            .step(index)
            .ok_or(WizardError::InvalidState { operation: "evaluate a step", state: "step" })?;
        let task = self.session.require_task(&context.task_id)?;
        let action = task
            .find_action(&context.action_id)
            .ok_or_else(|| WizardError::ActionNotFound(context.action_id.clone()))?;
        let extra = BTreeMap::from([
            ("task_id".to_string(), context.task_id.clone()),
            ("action_id".to_string(), context.action_id.clone()),
        ]);

        Ok(match self.steps.execute_step(action, step, value, &extra).await {
            StepExecutionResult::Success { step_id, value } => {
                self.autofill.remember(step, &value, self.session.current_task_type().as_ref());
                WizardEvent::Next { result: Some(StepResult { step_id, value, role: step.role }) }
            }
            StepExecutionResult::Skipped => WizardEvent::Next { result: None },
            StepExecutionResult::Error(message) => WizardEvent::Reject { message },
        })
    }

    /// Passes steps that the buffer can fill, stopping at the first step it
    /// cannot fill or whose buffered value does not validate.
    async fn auto_fill(&self, mut state: WizardState) -> Result<WizardState, WizardError> {
        let task_type = self.session.current_task_type();
        while let WizardState::Step { index, context } = &state {
            let buffered = context
                .step(*index)
                .and_then(|step| self.autofill.auto_fill_value(step, task_type.as_ref()));
            let Some(value) = buffered else {
                break;
            };
            let (index, context) = (*index, context.clone());
            let event = self.evaluate(index, &context, Some(value)).await?;
            if !matches!(event, WizardEvent::Next { .. }) {
                debug!(index, "buffered value rejected; waiting for input");
                break;
            }
            debug!(index, "step filled from buffer");
            state = self.machine.send(event).await?.state;
        }
        Ok(state)
    }

    async fn resolve_barcode(
        &self,
        object_type: ActionObjectType,
        barcode: &str,
    ) -> Result<Option<StepValue>, WizardError> {
        let lookup_failed =
            |e: PortError| WizardError::Port(format!("Lookup of {barcode} failed: {e}"));
        Ok(match object_type {
            ActionObjectType::ClassifierProduct | ActionObjectType::TaskProduct => self
                .products
                .find_product_by_barcode(barcode)
                .await
                .map_err(lookup_failed)?
                .map(StepValue::Product),
            ActionObjectType::ProductQuantity => self
                .products
                .find_product_by_barcode(barcode)
                .await
                .map_err(lookup_failed)?
                .map(|product| {
                    StepValue::TaskProduct(TaskProduct::from_product(product).with_quantity(1.0))
                }),
            ActionObjectType::Pallet => self
                .pallets
                .get_pallet_by_code(barcode)
                .await
                .map_err(lookup_failed)?
                .map(StepValue::Pallet),
            ActionObjectType::Bin => {
                self.bins.get_bin_by_code(barcode).await.map_err(lookup_failed)?.map(StepValue::Bin)
            }
        })
    }

    fn counted_product(&self, context: &WizardContext) -> Option<TaskProduct> {
        let results = context.ordered_results();
        let collected = results.into_iter().rev().find_map(|result| match result.value {
            StepValue::TaskProduct(product) => Some(product),
            StepValue::Product(product) => Some(TaskProduct::from_product(product)),
            _ => None,
        });
        collected.or_else(|| {
            let task = self.session.current_task()?;
            task.find_action(&context.action_id)?.storage_product.clone()
        })
    }

    async fn cancel_if_running(&self, action_id: &str) -> Result<(), WizardError> {
        let state = self.machine.state();
        if state.context().action_id == action_id && !state.is_terminal() {
            self.cancel().await?;
        }
        Ok(())
    }

    fn publish(&self, state: &WizardState) -> ActionWizardState {
        let snapshot = ActionWizardState::from(state);
        publish_distinct(&self.published, &snapshot);
        snapshot
    }

    fn start_observer(&self) {
        let mut states = self.machine.subscribe();
        states.mark_unchanged();
        let published = Arc::clone(&self.published);
        let handle = tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let snapshot = ActionWizardState::from(&*states.borrow_and_update());
                publish_distinct(&published, &snapshot);
            }
        });
        let previous =
            self.observer.lock().unwrap_or_else(PoisonError::into_inner).replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn stop_observer(&self) {
        if let Some(handle) = self.observer.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

impl Drop for FsmWizardAdapter {
    fn drop(&mut self) {
        self.stop_observer();
        self.context_watch.abort();
    }
}

/// Empties `autofill` whenever the session drops its task or switches to
/// another one.
fn watch_context(session: &TaskSession, autofill: Arc<AutoFillManager>) -> JoinHandle<()> {
    let mut tasks = session.subscribe_task();
    let mut active = tasks.borrow_and_update().as_ref().map(|task| task.id.clone());
    tokio::spawn(async move {
        while tasks.changed().await.is_ok() {
            let current = tasks.borrow_and_update().as_ref().map(|task| task.id.clone());
            if current.is_none() || current != active {
                debug!(previous = ?active, "task context reset; auto-fill buffer cleared");
                autofill.clear();
            }
            active = current;
        }
    })
}

fn publish_distinct(published: &watch::Sender<ActionWizardState>, snapshot: &ActionWizardState) {
    published.send_if_modified(|current| {
        if current == snapshot {
            false
        } else {
            current.clone_from(snapshot);
            true
        }
    });
}
