//! `task-wizard run` command.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::config::WizardConfig;
use crate::context::ServiceContext;
use crate::session::TaskSession;
use crate::wizard::{
    ActionWizardController, ActionWizardState, FsmWizardAdapter, WizardInput, WizardPhase,
};

/// Per-invocation switches of the `run` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    /// Action to start; the next one in strict order when `None`.
    pub action_id: Option<&'a str>,
    /// Print states as JSON lines.
    pub json: bool,
    /// Where to write the warehouse data once the script ends.
    pub save_to: Option<&'a Path>,
}

/// Execute the `run` command.
///
/// Loads the task, starts the wizard for the chosen action and feeds it
/// the inputs of `script`, printing the state after each one. The data
/// file itself is never modified; facts survive the process only when
/// `save_to` names a file, which is written even if an input is refused.
///
/// # Errors
///
/// Returns an error string if a file cannot be loaded or saved, the wizard
/// cannot start, or an input is not accepted in the current state.
pub async fn run(
    config: &WizardConfig,
    data: &Path,
    task_id: &str,
    script: &Path,
    options: &RunOptions<'_>,
) -> Result<(), String> {
    let inputs = load_script(script)?;
    let warehouse = super::load_warehouse(data)?;
    let ctx = ServiceContext::from_config(&warehouse, config)?;

    let session = Arc::new(TaskSession::new());
    session.load(ctx.tasks.as_ref(), task_id).await.map_err(|e| e.to_string())?;
    let adapter =
        Arc::new(FsmWizardAdapter::new(&ctx, Arc::clone(&session), super::order_validator()));
    let controller = ActionWizardController::new(adapter, session);

    let outcome = feed(&controller, task_id, &inputs, options).await;
    if let Some(path) = options.save_to {
        warehouse.save(path)?;
    }
    outcome
}

async fn feed(
    controller: &ActionWizardController,
    task_id: &str,
    inputs: &[WizardInput],
    options: &RunOptions<'_>,
) -> Result<(), String> {
    let started = match options.action_id {
        Some(action_id) => controller.start(task_id, action_id).await,
        None => controller.start_next(task_id).await,
    };
    print_state(&started.map_err(|e| e.to_string())?, options.json)?;

    for input in inputs {
        match controller.handle(input).await {
            Ok(state) => print_state(&state, options.json)?,
            Err(e) => {
                warn!(?input, error = %e, "input refused");
                return Err(format!("{input:?}: {e}"));
            }
        }
    }
    Ok(())
}

/// Reads a YAML list of wizard inputs.
///
/// # Errors
///
/// Returns an error string if the file cannot be read or parsed.
pub fn load_script(path: &Path) -> Result<Vec<WizardInput>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read script {}: {e}", path.display()))?;
    serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse script {}: {e}", path.display()))
}

fn print_state(state: &ActionWizardState, json: bool) -> Result<(), String> {
    if json {
        let line =
            serde_json::to_string(state).map_err(|e| format!("Failed to serialize state: {e}"))?;
        println!("{line}");
    } else {
        println!("{}", describe(state));
    }
    Ok(())
}

/// One-line summary of a wizard state, with the step error on a second line.
#[must_use]
pub fn describe(state: &ActionWizardState) -> String {
    let action = &state.action_id;
    let mut text = match state.phase {
        WizardPhase::Idle => "idle".to_string(),
        WizardPhase::Step => match (state.current_step_index, state.current_step()) {
            (Some(index), Some(step)) => format!(
                "{action}: step {}/{} {} [{}]",
                index + 1,
                state.steps.len(),
                step.name,
                step.object_type
            ),
            _ => format!("{action}: step"),
        },
        WizardPhase::Completing => format!("{action}: ready to complete"),
        WizardPhase::Completed => format!("{action}: completed"),
        WizardPhase::Cancelled => format!("{action}: cancelled"),
        WizardPhase::Error => {
            let message = state.error.as_deref().unwrap_or("unknown error");
            format!("{action}: failed: {message}")
        }
    };
    if let Some(error) = &state.step_error {
        text.push_str("\n  ! ");
        text.push_str(error);
    }
    text
}
