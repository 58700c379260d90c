//! Error types for task and wizard operations.
//!
//! Validation failures are not errors: they travel as messages on
//! [`crate::step::StepExecutionResult`] and on the wizard state. This
//! type covers state errors that abort the current operation.

use thiserror::Error;

use crate::validators::ActionBlockReason;

/// Errors returned by session, execution and wizard operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// No task is loaded into the session.
    #[error("no active task")]
    NoActiveTask,
    /// The active task is not the one the caller asked for.
    #[error("active task is {active}, not {requested}")]
    TaskMismatch {
        /// Id of the task held by the session.
        active: String,
        /// Id the caller passed.
        requested: String,
    },
    /// The task repository does not know the task.
    #[error("task {0} not found")]
    TaskNotFound(String),
    /// The task has no planned action with this id.
    #[error("planned action {0} not found")]
    ActionNotFound(String),
    /// Ordering rules forbid executing the action now.
    #[error("action {action_id} is blocked: {reason}")]
    ActionBlocked {
        /// The blocked action.
        action_id: String,
        /// Why it is blocked.
        reason: ActionBlockReason,
    },
    /// The action already has a recorded outcome.
    #[error("action {0} is already completed")]
    ActionAlreadyCompleted(String),
    /// The planned actions violate a structural invariant.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    /// The action template defines no steps.
    #[error("no steps available for action {0}")]
    NoSteps(String),
    /// The wizard is not in a state that accepts the operation.
    #[error("wizard cannot {operation} in state {state}")]
    InvalidState {
        /// What was attempted.
        operation: &'static str,
        /// Name of the current state.
        state: &'static str,
    },
    /// The wizard state machine task is no longer running.
    #[error("wizard state machine has stopped")]
    MachineStopped,
    /// An external collaborator failed.
    #[error("{0}")]
    Port(String),
}
