//! Runs the wizard FSM on its own task.
//!
//! The state lives inside a spawned worker. Callers send events over an
//! mpsc channel and wait for an acknowledgement carrying the resulting
//! state; observers subscribe to a `watch` channel that only changes when
//! the state does.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::state::{transition, WizardEvent, WizardState};
use crate::error::WizardError;

const COMMAND_BUFFER: usize = 32;

/// What applying one event did.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// `false` when the event was ignored.
    pub applied: bool,
    /// The state after the event.
    pub state: WizardState,
}

enum Command {
    Send { event: WizardEvent, ack: oneshot::Sender<TransitionOutcome> },
    Reset { ack: oneshot::Sender<WizardState> },
}

/// Handle to the wizard state machine worker.
///
/// Dropping the handle stops the worker.
pub struct WizardStateMachine {
    commands: mpsc::Sender<Command>,
    states: watch::Receiver<WizardState>,
    worker: JoinHandle<()>,
}

impl WizardStateMachine {
    /// Starts a machine in [`WizardState::Initializing`] with a blank context.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (publisher, states) = watch::channel(WizardState::default());
        let worker = tokio::spawn(run(rx, publisher));
        Self { commands, states, worker }
    }

    /// Applies `event` and returns the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::MachineStopped`] if the worker is gone.
    pub async fn send(&self, event: WizardEvent) -> Result<TransitionOutcome, WizardError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::Send { event, ack })
            .await
            .map_err(|_| WizardError::MachineStopped)?;
        done.await.map_err(|_| WizardError::MachineStopped)
    }

    /// Returns the machine to [`WizardState::Initializing`] with a blank context.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::MachineStopped`] if the worker is gone.
    pub async fn reset(&self) -> Result<WizardState, WizardError> {
        let (ack, done) = oneshot::channel();
        self.commands.send(Command::Reset { ack }).await.map_err(|_| WizardError::MachineStopped)?;
        done.await.map_err(|_| WizardError::MachineStopped)
    }

    /// The latest published state.
    #[must_use]
    pub fn state(&self) -> WizardState {
        self.states.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WizardState> {
        self.states.clone()
    }
}

impl Drop for WizardStateMachine {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run(mut commands: mpsc::Receiver<Command>, publisher: watch::Sender<WizardState>) {
    let mut state = WizardState::default();
    while let Some(command) = commands.recv().await {
        match command {
            Command::Send { event, ack } => {
                let applied = match transition(&state, &event) {
                    Some(next) => {
                        state = next;
                        publish(&publisher, &state);
                        true
                    }
                    None => false,
                };
                // The caller may have given up waiting.
                let _ = ack.send(TransitionOutcome { applied, state: state.clone() });
            }
            Command::Reset { ack } => {
                state = WizardState::default();
                publish(&publisher, &state);
                let _ = ack.send(state.clone());
            }
        }
    }
    debug!("wizard state machine stopped");
}

fn publish(publisher: &watch::Sender<WizardState>, state: &WizardState) {
    publisher.send_if_modified(|current| {
        if current == state {
            false
        } else {
            current.clone_from(state);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{epoch, put_template};
    use crate::wizard::context::WizardContext;

    fn initialize() -> WizardEvent {
        WizardEvent::Initialize {
            context: WizardContext::new("T1", "put-1", put_template().wizard_steps(), epoch()),
        }
    }

    #[tokio::test]
    async fn applies_events_and_publishes() {
        let machine = WizardStateMachine::spawn();
        let mut states = machine.subscribe();
        states.mark_unchanged();

        let outcome = machine.send(initialize()).await.unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.state.step_index(), Some(0));
        assert!(states.has_changed().unwrap());
        assert_eq!(machine.state(), outcome.state);
    }

    #[tokio::test]
    async fn ignored_events_do_not_notify() {
        let machine = WizardStateMachine::spawn();
        machine.send(initialize()).await.unwrap();
        let mut states = machine.subscribe();
        states.mark_unchanged();

        let outcome = machine.send(WizardEvent::Back).await.unwrap();
        assert!(!outcome.applied);
        assert!(!states.has_changed().unwrap());
    }

    #[tokio::test]
    async fn reset_returns_to_blank_initializing() {
        let machine = WizardStateMachine::spawn();
        machine.send(initialize()).await.unwrap();
        let state = machine.reset().await.unwrap();
        assert_eq!(state, WizardState::default());
        assert_eq!(machine.state(), WizardState::default());
    }
}
