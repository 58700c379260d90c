//! `task-wizard status` command.

use std::fmt::Write as _;
use std::path::Path;

use crate::model::{PlannedAction, Task};
use crate::ports::TaskRepository;
use crate::session::TaskSession;
use crate::validators::{ActionTier, FinalActionsValidator};

/// Execute the `status` command.
///
/// Prints every planned action with its tier, state and block reason,
/// followed by the next action in strict order.
///
/// # Errors
///
/// Returns an error string if the data file cannot be loaded or the task
/// does not exist.
pub async fn run(data: &Path, task_id: &str) -> Result<(), String> {
    let warehouse = super::load_warehouse(data)?;
    let session = TaskSession::new();
    let task = session
        .load(warehouse.as_ref() as &dyn TaskRepository, task_id)
        .await
        .map_err(|e| e.to_string())?;
    print!("{}", render(&task, &super::order_validator()));
    Ok(())
}

/// Formats the status table for `task`.
#[must_use]
pub fn render(task: &Task, validator: &FinalActionsValidator) -> String {
    let mut actions: Vec<&PlannedAction> = task.planned_actions.iter().collect();
    actions.sort_by_key(|action| action.order);

    let rows: Vec<[String; 5]> = actions
        .iter()
        .map(|action| {
            let blocked = if action.is_pending() {
                let reason = validator.action_block_reason(task, &action.id);
                if reason.is_blocked() { reason.to_string() } else { "ready".to_string() }
            } else {
                "-".to_string()
            };
            [
                action.order.to_string(),
                action.id.clone(),
                tier(action).to_string(),
                state(action).to_string(),
                blocked,
            ]
        })
        .collect();

    let headers = ["ORDER", "ID", "TIER", "STATE", "BLOCKED"];
    let widths: Vec<usize> = (0..headers.len())
        .map(|i| rows.iter().map(|row| row[i].len()).chain([headers[i].len()]).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "Task {} ({}) {:?}", task.id, task.name, task.status);
    let _ = writeln!(out, "{}", line(&headers.map(String::from), &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", line(&rule, &widths));
    for row in &rows {
        let _ = writeln!(out, "{}", line(row, &widths));
    }

    match validator.next_action_id_in_strict_order(task) {
        Some(id) => {
            let _ = writeln!(out, "\nNext action: {id}");
        }
        None if validator.can_complete_task(task) => {
            out.push_str("\nAll actions done; the task can be completed.\n");
        }
        None => out.push_str("\nNo action can be started.\n"),
    }
    out
}

fn line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn tier(action: &PlannedAction) -> &'static str {
    match ActionTier::of(action) {
        ActionTier::Initial => "initial",
        ActionTier::Regular => "regular",
        ActionTier::Final => "final",
    }
}

fn state(action: &PlannedAction) -> &'static str {
    if action.manually_completed {
        "completed (manual)"
    } else if action.is_completed {
        "completed"
    } else if action.is_skipped {
        "skipped"
    } else {
        "pending"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{complete_action, scenario_a};

    #[test]
    fn lists_actions_with_block_reasons() {
        let out = render(&scenario_a(), &crate::commands::order_validator());
        assert!(out.contains("ORDER  ID"));
        assert!(out.contains("init-1   initial  pending  ready"));
        assert!(out.contains("reg-3    regular  pending  initial actions are not completed"));
        assert!(out.contains("final-6  final    pending  initial actions are not completed"));
        assert!(out.contains("Next action: init-1"));
    }

    #[test]
    fn reports_a_finished_task() {
        let mut task = scenario_a();
        for id in ["init-1", "init-2", "reg-3", "reg-4", "reg-5", "final-6"] {
            complete_action(&mut task, id);
        }
        let out = render(&task, &crate::commands::order_validator());
        assert!(out.contains("final-6  final    completed  -"));
        assert!(out.contains("All actions done"));
    }
}
