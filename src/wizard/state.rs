//! Wizard states, events and the transition function.
//!
//! The machine is a plain enum. [`transition`] is pure: it never touches
//! I/O and returns `None` for events the current state does not accept,
//! which callers treat as "stay where you are".

use tracing::debug;

use super::context::WizardContext;
use crate::model::{ActionStep, StepResult};

/// A wizard state, each carrying the context it was reached with.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    /// Waiting for [`WizardEvent::Initialize`].
    Initializing {
        /// Context, blank until initialized.
        context: WizardContext,
    },
    /// Collecting the value of step `index`.
    Step {
        /// Index into `context.steps`.
        index: usize,
        /// Collected data.
        context: WizardContext,
    },
    /// Every step is done; waiting for the fact to be recorded.
    Completing {
        /// Collected data.
        context: WizardContext,
    },
    /// The fact was recorded.
    Completed {
        /// Collected data.
        context: WizardContext,
    },
    /// The operator abandoned the wizard.
    Cancelled {
        /// Collected data at the time of cancellation.
        context: WizardContext,
    },
    /// Initialization or completion failed.
    Error {
        /// What went wrong.
        message: String,
        /// Collected data at the time of failure.
        context: WizardContext,
    },
}

impl Default for WizardState {
    fn default() -> Self {
        Self::Initializing { context: WizardContext::blank() }
    }
}

impl WizardState {
    /// The context carried by the state.
    #[must_use]
    pub fn context(&self) -> &WizardContext {
        match self {
            Self::Initializing { context }
            | Self::Step { context, .. }
            | Self::Completing { context }
            | Self::Completed { context }
            | Self::Cancelled { context }
            | Self::Error { context, .. } => context,
        }
    }

    /// Short state name for logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initializing { .. } => "initializing",
            Self::Step { .. } => "step",
            Self::Completing { .. } => "completing",
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Error { .. } => "error",
        }
    }

    /// Completed and Cancelled accept no further forward events.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Cancelled { .. })
    }

    /// Index of the current step, if collecting.
    #[must_use]
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Step { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The step being collected.
    #[must_use]
    pub fn current_step(&self) -> Option<&ActionStep> {
        self.step_index().and_then(|index| self.context().step(index))
    }

    /// Fraction of steps done, `index / step_count`. Finished states report 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        let count = self.context().step_count();
        match self {
            Self::Step { index, .. } if count > 0 => *index as f64 / count as f64,
            Self::Completing { .. } | Self::Completed { .. } => 1.0,
            _ => 0.0,
        }
    }

    /// Whether [`WizardEvent::Back`] would move from a step.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        match self {
            Self::Step { index, context } => {
                *index > 0 && context.step(*index).is_some_and(|step| step.can_navigate_back)
            }
            _ => false,
        }
    }

    /// Whether every step has been passed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        match self {
            Self::Step { index, context } => *index >= context.step_count(),
            Self::Completing { .. } | Self::Completed { .. } => true,
            _ => false,
        }
    }
}

/// Inputs to the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    /// Starts the wizard with a fresh context.
    Initialize {
        /// Context to start with.
        context: WizardContext,
    },
    /// Accepts the current step's value (or its absence) and moves on.
    Next {
        /// Accepted value; `None` for a skipped step.
        result: Option<StepResult>,
    },
    /// Returns to the previous step.
    Back,
    /// A barcode was scanned on the current step.
    ProcessBarcode {
        /// The scanned code.
        barcode: String,
    },
    /// Finishes the wizard after the fact was recorded.
    Complete,
    /// The current step's value was rejected.
    Reject {
        /// Message shown on the step.
        message: String,
    },
    /// Abandons the wizard.
    Cancel,
    /// Moves to the error state.
    Fail {
        /// What went wrong.
        message: String,
    },
}

impl WizardEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Next { .. } => "next",
            Self::Back => "back",
            Self::ProcessBarcode { .. } => "process_barcode",
            Self::Complete => "complete",
            Self::Reject { .. } => "reject",
            Self::Cancel => "cancel",
            Self::Fail { .. } => "fail",
        }
    }
}

/// Computes the state that follows `state` on `event`.
///
/// Returns `None` when the event is not accepted in the current state or
/// when it does not change anything (a repeated barcode).
#[must_use]
pub fn transition(state: &WizardState, event: &WizardEvent) -> Option<WizardState> {
    let next = match (state, event) {
        (WizardState::Initializing { .. }, WizardEvent::Initialize { context }) => {
            Some(if context.steps.is_empty() {
                WizardState::Error {
                    message: "No steps available".to_string(),
                    context: context.clone(),
                }
            } else {
                WizardState::Step { index: 0, context: context.clone() }
            })
        }

        (WizardState::Step { index, context }, WizardEvent::Next { result }) => {
            let mut context = context.clone();
            if let Some(step) = context.step(*index) {
                let step_id = step.id.clone();
                match result {
                    Some(result) => {
                        context.results.insert(step_id, result.clone());
                    }
                    None => {
                        context.results.remove(&step_id);
                    }
                }
            }
            context.last_scanned_barcode = None;
            context.step_error = None;
            Some(if index + 1 >= context.step_count() {
                WizardState::Completing { context }
            } else {
                WizardState::Step { index: index + 1, context }
            })
        }

        (WizardState::Step { index, context }, WizardEvent::Back) if state.can_go_back() => {
            let mut context = context.clone();
            if let Some(step) = context.step(*index) {
                let step_id = step.id.clone();
                context.results.remove(&step_id);
            }
            context.last_scanned_barcode = None;
            context.step_error = None;
            Some(WizardState::Step { index: index - 1, context })
        }

        (WizardState::Step { index, context }, WizardEvent::ProcessBarcode { barcode }) => {
            if context.last_scanned_barcode.as_deref() == Some(barcode.as_str()) {
                None
            } else {
                let mut context = context.clone();
                context.last_scanned_barcode = Some(barcode.clone());
                context.step_error = None;
                Some(WizardState::Step { index: *index, context })
            }
        }

        (WizardState::Step { index, context }, WizardEvent::Reject { message }) => {
            let mut context = context.clone();
            context.step_error = Some(message.clone());
            Some(WizardState::Step { index: *index, context })
        }

        (WizardState::Step { index, context }, WizardEvent::Complete)
            if *index >= context.step_count() =>
        {
            Some(WizardState::Completed { context: context.clone() })
        }
        (WizardState::Completing { context }, WizardEvent::Complete) => {
            Some(WizardState::Completed { context: context.clone() })
        }

        (
            WizardState::Completing { context } | WizardState::Completed { context },
            WizardEvent::Back,
        ) if !context.steps.is_empty() => {
            let mut context = context.clone();
            context.last_scanned_barcode = None;
            context.step_error = None;
            Some(WizardState::Step { index: context.step_count() - 1, context })
        }

        (_, WizardEvent::Cancel) if !state.is_terminal() => {
            Some(WizardState::Cancelled { context: state.context().clone() })
        }
        (_, WizardEvent::Fail { message }) if !state.is_terminal() => Some(WizardState::Error {
            message: message.clone(),
            context: state.context().clone(),
        }),

        _ => None,
    };

    match &next {
        Some(next) => debug!(
            from = state.name(),
            to = next.name(),
            event = event.name(),
            "wizard transition"
        ),
        None => debug!(state = state.name(), event = event.name(), "wizard event ignored"),
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinX, StepRole, StepValue};
    use crate::testing::{epoch, put_template};

    fn context() -> WizardContext {
        WizardContext::new("T1", "put-1", put_template().wizard_steps(), epoch())
    }

    fn step_state(index: usize) -> WizardState {
        WizardState::Step { index, context: context() }
    }

    fn result(step_id: &str) -> StepResult {
        StepResult {
            step_id: step_id.into(),
            value: StepValue::Bin(BinX::new("A-01")),
            role: StepRole::Placement,
        }
    }

    fn apply(state: WizardState, event: WizardEvent) -> WizardState {
        transition(&state, &event).unwrap_or(state)
    }

    #[test]
    fn initialize_enters_first_step_or_errors() {
        let state = apply(WizardState::default(), WizardEvent::Initialize { context: context() });
        assert_eq!(state.step_index(), Some(0));

        let empty = WizardContext::new("T1", "a", Vec::new(), epoch());
        let state = apply(WizardState::default(), WizardEvent::Initialize { context: empty });
        assert!(matches!(state, WizardState::Error { .. }));
    }

    #[test]
    fn next_stores_result_and_reaches_completing() {
        let mut state = step_state(0);
        for id in ["product", "pallet", "bin"] {
            state = apply(state, WizardEvent::Next { result: Some(result(id)) });
        }
        assert!(matches!(state, WizardState::Completing { .. }));
        assert_eq!(state.context().ordered_results().len(), 3);
        assert!(state.is_completed());

        let done = apply(state, WizardEvent::Complete);
        assert!(matches!(done, WizardState::Completed { .. }));
    }

    #[test]
    fn skipped_step_leaves_no_result() {
        let state = apply(step_state(1), WizardEvent::Next { result: None });
        assert_eq!(state.step_index(), Some(2));
        assert!(state.context().result_for("pallet").is_none());
    }

    #[test]
    fn back_then_next_round_trips() {
        let from = apply(step_state(0), WizardEvent::Next { result: Some(result("product")) });
        let mut scanned = from.clone();
        if let WizardState::Step { context, .. } = &mut scanned {
            context.last_scanned_barcode = Some("X".into());
        }

        let back = apply(scanned, WizardEvent::Back);
        assert_eq!(back.step_index(), Some(0));
        assert!(back.context().last_scanned_barcode.is_none());

        let again = apply(back, WizardEvent::Next { result: Some(result("product")) });
        assert_eq!(again, from);
    }

    #[test]
    fn back_is_refused_on_first_step_and_locked_steps() {
        assert!(transition(&step_state(0), &WizardEvent::Back).is_none());

        let mut context = context();
        context.steps[1].can_navigate_back = false;
        let locked = WizardState::Step { index: 1, context };
        assert!(!locked.can_go_back());
        assert!(transition(&locked, &WizardEvent::Back).is_none());
    }

    #[test]
    fn repeated_barcode_is_ignored() {
        let scanned = apply(step_state(0), WizardEvent::ProcessBarcode { barcode: "123".into() });
        assert_eq!(scanned.context().last_scanned_barcode.as_deref(), Some("123"));
        let scan = |code: &str| WizardEvent::ProcessBarcode { barcode: code.into() };
        assert!(transition(&scanned, &scan("123")).is_none());
        assert!(transition(&scanned, &scan("456")).is_some());
    }

    #[test]
    fn back_from_summary_returns_to_last_step() {
        let completed = WizardState::Completed { context: context() };
        assert_eq!(apply(completed, WizardEvent::Back).step_index(), Some(2));
    }

    #[test]
    fn reject_sets_error_and_next_clears_it() {
        let rejected = apply(step_state(0), WizardEvent::Reject { message: "bad".into() });
        assert_eq!(rejected.context().step_error.as_deref(), Some("bad"));
        let next = apply(rejected, WizardEvent::Next { result: Some(result("product")) });
        assert!(next.context().step_error.is_none());
    }

    #[test]
    fn terminal_states_ignore_cancel_and_fail() {
        let cancelled = apply(step_state(1), WizardEvent::Cancel);
        assert!(matches!(cancelled, WizardState::Cancelled { .. }));
        assert!(transition(&cancelled, &WizardEvent::Cancel).is_none());
        assert!(transition(&cancelled, &WizardEvent::Next { result: None }).is_none());

        let failed = apply(
            WizardState::Completing { context: context() },
            WizardEvent::Fail { message: "x".into() },
        );
        assert!(matches!(failed, WizardState::Error { .. }));
    }

    #[test]
    fn progress_and_flags() {
        let state = step_state(1);
        assert!((state.progress() - 1.0 / 3.0).abs() < f64::EPSILON);
        assert!(state.can_go_back());
        assert!(!state.is_completed());
        assert_eq!(state.current_step().map(|s| s.id.as_str()), Some("pallet"));
    }
}
