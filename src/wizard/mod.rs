//! The action wizard: FSM, actor, adapter and controller.

pub mod adapter;
pub mod context;
pub mod controller;
pub mod machine;
pub mod state;

pub use adapter::{ActionWizardState, FsmWizardAdapter, WizardPhase};
pub use context::WizardContext;
pub use controller::{ActionWizardController, WizardInput};
pub use machine::{TransitionOutcome, WizardStateMachine};
pub use state::{transition, WizardEvent, WizardState};
