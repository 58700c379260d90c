//! Execution of a single wizard step.
//!
//! [`ActionStepExecutionService::execute_step`] turns a candidate value into
//! one of three outcomes. Missing values are checked against the step's
//! required/skip flags first, then the value is coerced to the step's
//! object type and finally validated against the step's rules with plan
//! items drawn from the active task.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::WizardError;
use crate::model::{
    ActionObjectType, ActionStep, PlannedAction, StepRole, StepValue, Task, TaskProduct,
};
use crate::session::TaskSession;
use crate::validation::{ValidationContext, ValidationResult, ValidationService};

/// Message for a missing value on a required step.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Message for a missing value on a step that cannot be skipped.
pub const CANNOT_SKIP_MESSAGE: &str = "This step cannot be skipped";

/// Outcome of executing one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepExecutionResult {
    /// The value was accepted, possibly after coercion.
    Success {
        /// Id of the executed step.
        step_id: String,
        /// The coerced value.
        value: StepValue,
    },
    /// The value was rejected; carries a message for the operator.
    Error(String),
    /// No value was given and the step allows skipping.
    Skipped,
}

/// Executes wizard steps against the active task.
pub struct ActionStepExecutionService {
    session: Arc<TaskSession>,
    validation: ValidationService,
}

impl ActionStepExecutionService {
    /// Creates a service reading plan items from `session`.
    #[must_use]
    pub fn new(session: Arc<TaskSession>, validation: ValidationService) -> Self {
        Self { session, validation }
    }

    /// Executes `step` of `action` with the candidate `value`.
    ///
    /// Blank text counts as a missing value.
    pub async fn execute_step(
        &self,
        action: &PlannedAction,
        step: &ActionStep,
        value: Option<StepValue>,
        extra: &BTreeMap<String, String>,
    ) -> StepExecutionResult {
        let Some(value) = value.filter(|v| !v.is_blank()) else {
            return missing_value(step);
        };

        let value = match coerce(step.object_type, value) {
            Ok(value) => value,
            Err(message) => {
                warn!(step_id = %step.id, %message, "step value rejected");
                return StepExecutionResult::Error(message);
            }
        };

        let context = match self.build_step_context(action, step, extra) {
            Ok(context) => context,
            Err(e) => return StepExecutionResult::Error(e.to_string()),
        };

        match self.validation.validate_async(&step.validation_rules, Some(&value), &context).await {
            ValidationResult::Success => {
                debug!(step_id = %step.id, kind = value.kind_name(), "step accepted");
                StepExecutionResult::Success { step_id: step.id.clone(), value }
            }
            ValidationResult::Error(message) => {
                warn!(step_id = %step.id, %message, "step value failed validation");
                StepExecutionResult::Error(message)
            }
            ValidationResult::ApiValidationRequired(item) => {
                StepExecutionResult::Error(item.error_message)
            }
        }
    }

    /// Builds the validation context for `step`: the plan items its value
    /// must come from, collected across every planned action of the active
    /// task.
    ///
    /// Product steps see every planned product (storage and placement, one
    /// entry per product id). Pallet steps see the storage or placement
    /// pallets depending on which side of the template the step belongs
    /// to. Placement bin steps see the placement bins; storage bin steps
    /// have no list.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoActiveTask`] when the session is empty.
    pub fn build_step_context(
        &self,
        action: &PlannedAction,
        step: &ActionStep,
        extra: &BTreeMap<String, String>,
    ) -> Result<ValidationContext, WizardError> {
        let task = self.session.current_task().ok_or(WizardError::NoActiveTask)?;
        let role = action.action_template.role_of(&step.id);
        Ok(ValidationContext {
            plan_items: plan_items(&task, step.object_type, role),
            extra: extra.clone(),
        })
    }
}

fn missing_value(step: &ActionStep) -> StepExecutionResult {
    if step.is_required {
        StepExecutionResult::Error(REQUIRED_MESSAGE.to_string())
    } else if !step.can_skip {
        StepExecutionResult::Error(CANNOT_SKIP_MESSAGE.to_string())
    } else {
        debug!(step_id = %step.id, "step skipped");
        StepExecutionResult::Skipped
    }
}

/// Converts `value` into the shape `object_type` collects.
///
/// Raw text is never accepted: scans must be resolved to a domain object
/// before they reach a step.
fn coerce(object_type: ActionObjectType, value: StepValue) -> Result<StepValue, String> {
    match (object_type, value) {
        (ActionObjectType::ClassifierProduct, value @ StepValue::Product(_))
        | (ActionObjectType::TaskProduct, value @ StepValue::TaskProduct(_))
        | (ActionObjectType::Pallet, value @ StepValue::Pallet(_))
        | (ActionObjectType::Bin, value @ StepValue::Bin(_)) => Ok(value),
        (ActionObjectType::ClassifierProduct, StepValue::TaskProduct(task_product)) => {
            Ok(StepValue::Product(task_product.product))
        }
        (ActionObjectType::TaskProduct, StepValue::Product(product)) => {
            Ok(StepValue::TaskProduct(TaskProduct::from_product(product)))
        }
        (ActionObjectType::ProductQuantity, StepValue::TaskProduct(task_product))
            if task_product.quantity > 0.0 =>
        {
            Ok(StepValue::TaskProduct(task_product))
        }
        (object_type, value) => {
            Err(format!("Wrong data type for {object_type}: got {}", value.kind_name()))
        }
    }
}

fn plan_items(
    task: &Task,
    object_type: ActionObjectType,
    role: StepRole,
) -> Option<Vec<StepValue>> {
    let mut items: Vec<StepValue> = Vec::new();
    let mut push_unique = |value: StepValue| {
        let key = value.as_match_text();
        let seen = items
            .iter()
            .any(|item| item.kind_name() == value.kind_name() && item.as_match_text() == key);
        if !seen {
            items.push(value);
        }
    };

    match (object_type, role) {
        (
            ActionObjectType::ClassifierProduct
            | ActionObjectType::TaskProduct
            | ActionObjectType::ProductQuantity,
            _,
        ) => {
            for action in &task.planned_actions {
                let planned = [&action.storage_product, &action.placement_product];
                for product in planned.into_iter().flatten() {
                    push_unique(StepValue::TaskProduct(product.clone()));
                }
            }
        }
        (ActionObjectType::Pallet, StepRole::Storage) => {
            for pallet in task.planned_actions.iter().filter_map(|a| a.storage_pallet.as_ref()) {
                push_unique(StepValue::Pallet(pallet.clone()));
            }
        }
        (ActionObjectType::Pallet, StepRole::Placement) => {
            for pallet in task.planned_actions.iter().filter_map(|a| a.placement_pallet.as_ref()) {
                push_unique(StepValue::Pallet(pallet.clone()));
            }
        }
        (ActionObjectType::Bin, StepRole::Placement) => {
            for bin in task.planned_actions.iter().filter_map(|a| a.placement_bin.as_ref()) {
                push_unique(StepValue::Bin(bin.clone()));
            }
        }
        (ActionObjectType::Pallet | ActionObjectType::Bin, _) => return None,
    }

    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinX, Pallet, Product};
    use crate::testing::{milk, put_action, put_task};

    fn service() -> (Arc<TaskSession>, ActionStepExecutionService) {
        let session = Arc::new(TaskSession::new());
        session.set_task(put_task(), None).unwrap();
        let service =
            ActionStepExecutionService::new(Arc::clone(&session), ValidationService::default());
        (session, service)
    }

    fn step(action: &PlannedAction, id: &str) -> ActionStep {
        action.action_template.wizard_steps().into_iter().find(|s| s.id == id).unwrap()
    }

    async fn offer(
        service: &ActionStepExecutionService,
        step_id: &str,
        value: StepValue,
    ) -> StepExecutionResult {
        let action = put_action("put-1", 1);
        service.execute_step(&action, &step(&action, step_id), Some(value), &BTreeMap::new()).await
    }

    #[tokio::test]
    async fn missing_value_follows_step_flags() {
        let (_, service) = service();
        let action = put_action("put-1", 1);
        let extra = BTreeMap::new();

        let product = step(&action, "product");
        assert_eq!(
            service.execute_step(&action, &product, None, &extra).await,
            StepExecutionResult::Error(REQUIRED_MESSAGE.into())
        );

        let pallet = step(&action, "pallet");
        assert_eq!(
            service.execute_step(&action, &pallet, None, &extra).await,
            StepExecutionResult::Skipped
        );

        let strict = ActionStep { is_required: false, can_skip: false, ..pallet };
        assert_eq!(
            service.execute_step(&action, &strict, None, &extra).await,
            StepExecutionResult::Error(CANNOT_SKIP_MESSAGE.into())
        );
    }

    #[tokio::test]
    async fn blank_text_counts_as_missing() {
        let (_, service) = service();
        let result = offer(&service, "product", StepValue::Text(" ".into())).await;
        assert_eq!(result, StepExecutionResult::Error(REQUIRED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn bare_product_is_wrapped_for_task_product_steps() {
        let (_, service) = service();
        let result = offer(&service, "product", StepValue::Product(milk())).await;
        assert_eq!(
            result,
            StepExecutionResult::Success {
                step_id: "product".into(),
                value: StepValue::TaskProduct(TaskProduct::from_product(milk())),
            }
        );
    }

    #[tokio::test]
    async fn raw_text_is_rejected() {
        let (_, service) = service();
        let result = offer(&service, "bin", StepValue::Text("A-01".into())).await;
        assert!(matches!(
            result,
            StepExecutionResult::Error(m) if m.starts_with("Wrong data type")
        ));
    }

    #[tokio::test]
    async fn plan_membership_is_checked() {
        let (_, service) = service();
        let ok = offer(&service, "bin", StepValue::Bin(BinX::new("A-01"))).await;
        assert!(matches!(ok, StepExecutionResult::Success { .. }));

        let wrong = offer(&service, "bin", StepValue::Bin(BinX::new("Z-99"))).await;
        assert_eq!(wrong, StepExecutionResult::Error("Bin is not in the plan".into()));
    }

    #[tokio::test]
    async fn no_active_task_is_an_error() {
        let (session, service) = service();
        session.clear_context();
        let result = offer(&service, "bin", StepValue::Bin(BinX::new("A-01"))).await;
        assert_eq!(result, StepExecutionResult::Error(WizardError::NoActiveTask.to_string()));
    }

    #[test]
    fn coercion_table() {
        let product = Product::new("P1", "Milk");
        let task_product = TaskProduct::from_product(product.clone());

        let counted = StepValue::TaskProduct(task_product.clone());
        assert_eq!(
            coerce(ActionObjectType::ClassifierProduct, counted.clone()),
            Ok(StepValue::Product(product.clone()))
        );
        assert!(coerce(ActionObjectType::ProductQuantity, counted).is_err());
        assert!(coerce(
            ActionObjectType::ProductQuantity,
            StepValue::TaskProduct(task_product.with_quantity(3.0))
        )
        .is_ok());
        assert!(coerce(ActionObjectType::Pallet, StepValue::Bin(BinX::new("A"))).is_err());
        assert!(coerce(ActionObjectType::Bin, StepValue::Quantity(1.0)).is_err());
        assert!(coerce(ActionObjectType::Pallet, StepValue::Pallet(Pallet::new("PAL"))).is_ok());
    }

    #[test]
    fn context_collects_plan_items_per_side() {
        let (_, service) = service();
        let action = put_action("put-1", 1);
        let extra = BTreeMap::new();

        let products =
            service.build_step_context(&action, &step(&action, "product"), &extra).unwrap();
        assert_eq!(products.plan_items.map(|items| items.len()), Some(1));

        let pallets =
            service.build_step_context(&action, &step(&action, "pallet"), &extra).unwrap();
        assert_eq!(pallets.plan_items, Some(vec![StepValue::Pallet(Pallet::new("PAL-1"))]));

        let storage_bin = ActionStep { id: "src-bin".into(), ..step(&action, "bin") };
        let mut storage_action = action.clone();
        storage_action.action_template.storage_steps.push(storage_bin.clone());
        let context = service.build_step_context(&storage_action, &storage_bin, &extra).unwrap();
        assert_eq!(context.plan_items, None);
    }
}
