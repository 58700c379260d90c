//! Planned and recorded actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{BinX, Pallet, TaskProduct};
use super::step::{ActionObjectType, ActionStep, StepRole};

/// Warehouse operation performed by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WmsAction {
    /// Goods arrive into the warehouse.
    Receipt,
    /// Goods leave the warehouse.
    Expense,
    /// Goods are put into a bin or onto a pallet.
    Put,
    /// Goods are taken from a bin or pallet.
    Take,
    /// Stock is counted.
    Recount,
}

/// Describes the steps an action requires for its storage and placement sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTemplate {
    /// Template identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Operation performed.
    pub wms_action: WmsAction,
    /// Object collected on the storage side.
    #[serde(default)]
    pub storage_object_type: Option<ActionObjectType>,
    /// Object collected on the placement side.
    #[serde(default)]
    pub placement_object_type: Option<ActionObjectType>,
    /// Steps for the storage side.
    #[serde(default)]
    pub storage_steps: Vec<ActionStep>,
    /// Steps for the placement side.
    #[serde(default)]
    pub placement_steps: Vec<ActionStep>,
}

impl ActionTemplate {
    /// Returns the wizard steps: storage steps then placement steps, each
    /// list sorted by `order` and tagged with its role.
    #[must_use]
    pub fn wizard_steps(&self) -> Vec<ActionStep> {
        let mut storage = self.storage_steps.clone();
        storage.sort_by_key(|step| step.order);
        let mut placement = self.placement_steps.clone();
        placement.sort_by_key(|step| step.order);

        storage
            .into_iter()
            .map(|step| ActionStep { role: StepRole::Storage, ..step })
            .chain(
                placement.into_iter().map(|step| ActionStep { role: StepRole::Placement, ..step }),
            )
            .collect()
    }

    /// Returns which list the step id belongs to.
    #[must_use]
    pub fn role_of(&self, step_id: &str) -> StepRole {
        if self.storage_steps.iter().any(|step| step.id == step_id) {
            StepRole::Storage
        } else if self.placement_steps.iter().any(|step| step.id == step_id) {
            StepRole::Placement
        } else {
            StepRole::Unassigned
        }
    }
}

/// One unit of planned work in a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
    /// Action identifier.
    pub id: String,
    /// Execution order; unique within a task.
    pub order: u32,
    /// Must run before any regular action.
    #[serde(default)]
    pub is_initial_action: bool,
    /// Runs only after every regular action.
    #[serde(default)]
    pub is_final_action: bool,
    /// A fact has been recorded (or the action was completed by hand).
    #[serde(default)]
    pub is_completed: bool,
    /// The operator skipped the action.
    #[serde(default)]
    pub is_skipped: bool,
    /// Completed without running the wizard.
    #[serde(default)]
    pub manually_completed: bool,
    /// Operation performed.
    pub wms_action: WmsAction,
    /// Planned product to take.
    #[serde(default)]
    pub storage_product: Option<TaskProduct>,
    /// Planned product to put.
    #[serde(default)]
    pub placement_product: Option<TaskProduct>,
    /// Planned source pallet.
    #[serde(default)]
    pub storage_pallet: Option<Pallet>,
    /// Planned target pallet.
    #[serde(default)]
    pub placement_pallet: Option<Pallet>,
    /// Planned source bin.
    #[serde(default)]
    pub storage_bin: Option<BinX>,
    /// Planned target bin.
    #[serde(default)]
    pub placement_bin: Option<BinX>,
    /// Step template for the wizard.
    pub action_template: ActionTemplate,
}

impl PlannedAction {
    /// Neither completed nor skipped.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.is_completed && !self.is_skipped
    }

    /// Neither initial nor final.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        !self.is_initial_action && !self.is_final_action
    }
}

/// The recorded outcome of executing a planned action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactAction {
    /// Fact identifier.
    pub id: String,
    /// Owning task.
    pub task_id: String,
    /// The planned action this fact was recorded for.
    pub planned_action_id: String,
    /// Operation performed.
    pub wms_action: WmsAction,
    /// Product taken.
    #[serde(default)]
    pub storage_product: Option<TaskProduct>,
    /// Product put.
    #[serde(default)]
    pub placement_product: Option<TaskProduct>,
    /// Source pallet.
    #[serde(default)]
    pub storage_pallet: Option<Pallet>,
    /// Target pallet.
    #[serde(default)]
    pub placement_pallet: Option<Pallet>,
    /// Source bin.
    #[serde(default)]
    pub storage_bin: Option<BinX>,
    /// Target bin.
    #[serde(default)]
    pub placement_bin: Option<BinX>,
    /// When the wizard started.
    pub started_at: DateTime<Utc>,
    /// When the fact was recorded.
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ActionTemplate {
        let mut second = ActionStep::new("s2", "Second", ActionObjectType::Bin);
        second.order = 2;
        let mut first = ActionStep::new("s1", "First", ActionObjectType::TaskProduct);
        first.order = 1;
        ActionTemplate {
            id: "T".into(),
            name: "Move".into(),
            wms_action: WmsAction::Put,
            storage_object_type: Some(ActionObjectType::TaskProduct),
            placement_object_type: Some(ActionObjectType::Bin),
            storage_steps: vec![second, first],
            placement_steps: vec![ActionStep::new("p1", "Bin", ActionObjectType::Bin)],
        }
    }

    #[test]
    fn wizard_steps_are_sorted_and_tagged() {
        let steps = template().wizard_steps();
        let ids: Vec<_> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "p1"]);
        assert_eq!(steps[0].role, StepRole::Storage);
        assert_eq!(steps[2].role, StepRole::Placement);
    }

    #[test]
    fn role_of_unknown_step_is_unassigned() {
        let template = template();
        assert_eq!(template.role_of("p1"), StepRole::Placement);
        assert_eq!(template.role_of("nope"), StepRole::Unassigned);
    }
}
