//! Shared fixtures for unit tests.

use chrono::{DateTime, Utc};

use crate::model::{
    ActionObjectType, ActionStep, ActionTemplate, BinX, Pallet, PlannedAction, Product, Task,
    TaskProduct, TaskStatus, ValidationRule, ValidationRuleItem, ValidationRuleKind, WmsAction,
};

pub(crate) fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub(crate) fn empty_template() -> ActionTemplate {
    ActionTemplate {
        id: "tpl-empty".into(),
        name: "Empty".into(),
        wms_action: WmsAction::Put,
        storage_object_type: None,
        placement_object_type: None,
        storage_steps: Vec::new(),
        placement_steps: Vec::new(),
    }
}

pub(crate) fn action(id: &str, order: u32) -> PlannedAction {
    PlannedAction {
        id: id.into(),
        order,
        is_initial_action: false,
        is_final_action: false,
        is_completed: false,
        is_skipped: false,
        manually_completed: false,
        wms_action: WmsAction::Put,
        storage_product: None,
        placement_product: None,
        storage_pallet: None,
        placement_pallet: None,
        storage_bin: None,
        placement_bin: None,
        action_template: empty_template(),
    }
}

pub(crate) fn initial(id: &str, order: u32) -> PlannedAction {
    PlannedAction { is_initial_action: true, ..action(id, order) }
}

pub(crate) fn final_action(id: &str, order: u32) -> PlannedAction {
    PlannedAction { is_final_action: true, ..action(id, order) }
}

pub(crate) fn completed(action: PlannedAction) -> PlannedAction {
    PlannedAction { is_completed: true, ..action }
}

pub(crate) fn skipped(action: PlannedAction) -> PlannedAction {
    PlannedAction { is_skipped: true, ..action }
}

pub(crate) fn task_with(planned_actions: Vec<PlannedAction>) -> Task {
    Task {
        id: "T1".into(),
        name: "Test task".into(),
        status: TaskStatus::ToDo,
        task_type_id: None,
        planned_actions,
        fact_actions: Vec::new(),
        last_modified_at: epoch(),
    }
}

/// Marks an action completed and bumps the task stamp, as the services do.
pub(crate) fn complete_action(task: &mut Task, action_id: &str) {
    task.find_action_mut(action_id).unwrap().is_completed = true;
    let now = task.last_modified_at;
    task.touch(now);
}

/// Two initial actions, three regular and one final, orders 1 to 6.
pub(crate) fn scenario_a() -> Task {
    task_with(vec![
        initial("init-1", 1),
        initial("init-2", 2),
        action("reg-3", 3),
        action("reg-4", 4),
        action("reg-5", 5),
        final_action("final-6", 6),
    ])
}

pub(crate) fn rule(items: &[(ValidationRuleKind, &str)]) -> ValidationRule {
    ValidationRule::new(
        items
            .iter()
            .map(|(kind, message)| ValidationRuleItem::new(kind.clone(), *message))
            .collect(),
    )
}

pub(crate) fn milk() -> Product {
    Product { barcodes: vec!["4600000000017".into()], ..Product::new("P1", "Milk") }
}

/// Take a product, put it onto a pallet in a bin.
pub(crate) fn put_template() -> ActionTemplate {
    let product = ActionStep {
        validation_rules: rule(&[
            (ValidationRuleKind::NotEmpty, "Scan a product"),
            (ValidationRuleKind::FromPlan, "Product is not in the plan"),
        ]),
        save_to_buffer: true,
        ..ActionStep::new("product", "Product", ActionObjectType::TaskProduct)
    };
    let pallet = ActionStep {
        order: 1,
        is_required: false,
        can_skip: true,
        validation_rules: rule(&[(ValidationRuleKind::FromPlan, "Pallet is not in the plan")]),
        ..ActionStep::new("pallet", "Pallet", ActionObjectType::Pallet)
    };
    let bin = ActionStep {
        order: 2,
        validation_rules: rule(&[
            (ValidationRuleKind::NotEmpty, "Scan a bin"),
            (ValidationRuleKind::FromPlan, "Bin is not in the plan"),
        ]),
        ..ActionStep::new("bin", "Bin", ActionObjectType::Bin)
    };
    ActionTemplate {
        id: "tpl-put".into(),
        name: "Put".into(),
        wms_action: WmsAction::Put,
        storage_object_type: Some(ActionObjectType::TaskProduct),
        placement_object_type: Some(ActionObjectType::Bin),
        storage_steps: vec![product],
        placement_steps: vec![pallet, bin],
    }
}

pub(crate) fn put_action(id: &str, order: u32) -> PlannedAction {
    PlannedAction {
        storage_product: Some(TaskProduct::from_product(milk()).with_quantity(2.0)),
        placement_pallet: Some(Pallet::new("PAL-1")),
        placement_bin: Some(BinX::new("A-01")),
        action_template: put_template(),
        ..action(id, order)
    }
}

pub(crate) fn put_task() -> Task {
    task_with(vec![put_action("put-1", 1), put_action("put-2", 2)])
}
