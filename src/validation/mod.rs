//! Rule evaluation for step values.
//!
//! Applies a step's [`ValidationRule`] to a candidate value. Items are
//! evaluated in declared order and the first failure wins. Nothing here
//! panics or returns `Err`: every problem, including a broken pattern or a
//! missing remote validator, becomes a [`ValidationResult::Error`].

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use crate::model::{StepValue, ValidationRule, ValidationRuleItem, ValidationRuleKind};
use crate::ports::ValidationApi;

/// Data a rule may consult besides the value itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationContext {
    /// Planned values for `FROM_PLAN`. `None` means there is no list to check against.
    pub plan_items: Option<Vec<StepValue>>,
    /// Free-form extra data supplied by the caller.
    pub extra: BTreeMap<String, String>,
}

impl ValidationContext {
    /// Creates a context with the given plan items.
    #[must_use]
    pub fn with_plan_items(plan_items: Vec<StepValue>) -> Self {
        Self { plan_items: Some(plan_items), extra: BTreeMap::new() }
    }
}

/// Outcome of evaluating a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Every item passed.
    Success,
    /// An item failed; carries its message.
    Error(String),
    /// Evaluation reached an `API_REQUEST` item that only the async path can resolve.
    ApiValidationRequired(ValidationRuleItem),
}

impl ValidationResult {
    /// Returns `true` for [`ValidationResult::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Evaluates validation rules, optionally delegating to a remote validator.
#[derive(Clone, Default)]
pub struct ValidationService {
    api: Option<Arc<dyn ValidationApi>>,
}

impl ValidationService {
    /// Creates a service that resolves `API_REQUEST` rules through `api`.
    #[must_use]
    pub fn new(api: Option<Arc<dyn ValidationApi>>) -> Self {
        Self { api }
    }

    /// Evaluates `rule` without remote calls.
    ///
    /// Stops at the first `API_REQUEST` item that needs checking and
    /// returns [`ValidationResult::ApiValidationRequired`] for it.
    #[must_use]
    pub fn validate(
        &self,
        rule: &ValidationRule,
        value: Option<&StepValue>,
        context: &ValidationContext,
    ) -> ValidationResult {
        for item in &rule.items {
            match check_local(item, value, context) {
                Check::Pass => {}
                Check::Fail(message) => return ValidationResult::Error(message),
                Check::Remote(_) => return ValidationResult::ApiValidationRequired(item.clone()),
            }
        }
        ValidationResult::Success
    }

    /// Evaluates `rule`, calling the remote validator for `API_REQUEST` items.
    ///
    /// Never returns [`ValidationResult::ApiValidationRequired`].
    pub async fn validate_async(
        &self,
        rule: &ValidationRule,
        value: Option<&StepValue>,
        context: &ValidationContext,
    ) -> ValidationResult {
        for item in &rule.items {
            match check_local(item, value, context) {
                Check::Pass => {}
                Check::Fail(message) => return ValidationResult::Error(message),
                Check::Remote(endpoint) => {
                    let text = value.map(StepValue::as_match_text).unwrap_or_default();
                    if let Err(message) = self.check_remote(item, endpoint, &text).await {
                        return ValidationResult::Error(message);
                    }
                }
            }
        }
        ValidationResult::Success
    }

    async fn check_remote(
        &self,
        item: &ValidationRuleItem,
        endpoint: &str,
        text: &str,
    ) -> Result<(), String> {
        let Some(api) = &self.api else {
            warn!(endpoint, "API_REQUEST rule without a configured validation API");
            return Err(format!("Validation service is not configured for {endpoint}"));
        };
        match api.validate(endpoint, text).await {
            Ok(verdict) if verdict.is_valid => Ok(()),
            Ok(verdict) => Err(verdict.error_message.unwrap_or_else(|| item.error_message.clone())),
            Err(e) => {
                warn!(endpoint, error = %e, "remote validation failed");
                Err(format!("Remote validation failed: {e}"))
            }
        }
    }
}

/// Local verdict for one rule item.
enum Check<'a> {
    Pass,
    Fail(String),
    Remote(&'a str),
}

fn check_local<'a>(
    item: &'a ValidationRuleItem,
    value: Option<&StepValue>,
    context: &ValidationContext,
) -> Check<'a> {
    let fail = || Check::Fail(item.error_message.clone());
    match &item.kind {
        ValidationRuleKind::NotEmpty => match value {
            None => fail(),
            Some(value) if value.is_blank() => fail(),
            Some(_) => Check::Pass,
        },
        ValidationRuleKind::FromPlan => match (value, &context.plan_items) {
            (None, _) | (_, None) => Check::Pass,
            (Some(value), Some(items)) => {
                if items.iter().any(|planned| matches_plan_item(value, planned)) {
                    Check::Pass
                } else {
                    debug!(value = %value.as_match_text(), "value not found in plan");
                    fail()
                }
            }
        },
        ValidationRuleKind::MatchesRegex { pattern } => {
            let Some(value) = value else { return Check::Pass };
            match Regex::new(pattern) {
                Ok(regex) if regex.is_match(&value.as_match_text()) => Check::Pass,
                Ok(_) => fail(),
                Err(e) => Check::Fail(format!("Invalid validation pattern '{pattern}': {e}")),
            }
        }
        ValidationRuleKind::ApiRequest { endpoint } => match value {
            None => Check::Pass,
            Some(_) => Check::Remote(endpoint),
        },
    }
}

/// Compares a candidate with a planned value by natural key.
///
/// Products compare by product id only, so batch attributes such as
/// expiration date or status never cause a mismatch.
fn matches_plan_item(value: &StepValue, planned: &StepValue) -> bool {
    match (value, planned) {
        (StepValue::Pallet(a), StepValue::Pallet(b)) => a.code == b.code,
        (StepValue::Bin(a), StepValue::Bin(b)) => a.code == b.code,
        (StepValue::Quantity(a), StepValue::Quantity(b)) => (a - b).abs() < f64::EPSILON,
        (StepValue::Text(text), planned) => *text == planned.as_match_text(),
        (value, planned) => match (value.product_id(), planned.product_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;
    use crate::model::{BinX, Pallet, Product, ProductStatus, TaskProduct};
    use crate::ports::{ApiValidation, PortFuture};

    struct CountingApi {
        calls: AtomicUsize,
        verdict: ApiValidation,
    }

    impl CountingApi {
        fn new(is_valid: bool, error_message: Option<&str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                verdict: ApiValidation {
                    is_valid,
                    error_message: error_message.map(String::from),
                },
            }
        }
    }

    impl ValidationApi for CountingApi {
        fn validate(&self, _endpoint: &str, _value: &str) -> PortFuture<'_, ApiValidation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let verdict = self.verdict.clone();
            Box::pin(async move { Ok(verdict) })
        }
    }

    struct BrokenApi;

    impl ValidationApi for BrokenApi {
        fn validate(&self, _endpoint: &str, _value: &str) -> PortFuture<'_, ApiValidation> {
            Box::pin(async { Err("connection refused".into()) })
        }
    }

    fn item(kind: ValidationRuleKind, message: &str) -> ValidationRuleItem {
        ValidationRuleItem::new(kind, message)
    }

    fn regex(pattern: &str) -> ValidationRuleKind {
        ValidationRuleKind::MatchesRegex { pattern: pattern.into() }
    }

    fn api(endpoint: &str) -> ValidationRuleKind {
        ValidationRuleKind::ApiRequest { endpoint: endpoint.into() }
    }

    #[test]
    fn not_empty_fails_before_regex_is_consulted() {
        let rule = ValidationRule::new(vec![
            item(ValidationRuleKind::NotEmpty, "empty"),
            item(regex(r"^\d+$"), "digits only"),
        ]);
        let service = ValidationService::default();
        let empty = StepValue::Text(String::new());
        let result = service.validate(&rule, Some(&empty), &ValidationContext::default());
        assert_eq!(result, ValidationResult::Error("empty".into()));
    }

    #[test]
    fn not_empty_fails_on_missing_value() {
        let rule = ValidationRule::new(vec![item(ValidationRuleKind::NotEmpty, "empty")]);
        let result =
            ValidationService::default().validate(&rule, None, &ValidationContext::default());
        assert_eq!(result, ValidationResult::Error("empty".into()));
    }

    #[test]
    fn from_plan_compares_task_products_by_product_id_only() {
        let rule = ValidationRule::new(vec![item(ValidationRuleKind::FromPlan, "not planned")]);
        let planned = StepValue::Product(Product::new("P1", "Milk"));
        let context = ValidationContext::with_plan_items(vec![planned]);
        let candidate = StepValue::TaskProduct(TaskProduct {
            product: Product::new("P1", "Milk 2.5%"),
            expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            status: ProductStatus::Defective,
            quantity: 4.0,
        });
        let result = ValidationService::default().validate(&rule, Some(&candidate), &context);
        assert!(result.is_success());
    }

    #[test]
    fn from_plan_rejects_unplanned_bin() {
        let rule = ValidationRule::new(vec![item(ValidationRuleKind::FromPlan, "wrong bin")]);
        let context = ValidationContext::with_plan_items(vec![StepValue::Bin(BinX::new("A-1"))]);
        let result = ValidationService::default().validate(
            &rule,
            Some(&StepValue::Bin(BinX::new("B-2"))),
            &context,
        );
        assert_eq!(result, ValidationResult::Error("wrong bin".into()));
    }

    #[test]
    fn from_plan_with_empty_list_fails_and_without_list_passes() {
        let rule = ValidationRule::new(vec![item(ValidationRuleKind::FromPlan, "wrong pallet")]);
        let value = StepValue::Pallet(Pallet::new("PAL-1"));
        let service = ValidationService::default();

        let empty = ValidationContext::with_plan_items(Vec::new());
        assert!(!service.validate(&rule, Some(&value), &empty).is_success());
        assert!(service.validate(&rule, Some(&value), &ValidationContext::default()).is_success());
    }

    #[test]
    fn regex_uses_code_projection() {
        let rule = ValidationRule::new(vec![item(regex("^PAL-"), "bad code")]);
        let service = ValidationService::default();
        let context = ValidationContext::default();
        assert!(service
            .validate(&rule, Some(&StepValue::Pallet(Pallet::new("PAL-9"))), &context)
            .is_success());
        assert!(!service
            .validate(&rule, Some(&StepValue::Bin(BinX::new("A-1"))), &context)
            .is_success());
    }

    #[test]
    fn invalid_regex_is_reported_as_error() {
        let rule = ValidationRule::new(vec![item(regex("(unclosed"), "bad")]);
        let result = ValidationService::default().validate(
            &rule,
            Some(&StepValue::Text("x".into())),
            &ValidationContext::default(),
        );
        match result {
            ValidationResult::Error(message) => assert!(message.contains("(unclosed")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn sync_path_defers_api_rules() {
        let rule = ValidationRule::new(vec![item(api("bins/check"), "rejected")]);
        let result = ValidationService::default().validate(
            &rule,
            Some(&StepValue::Text("A".into())),
            &ValidationContext::default(),
        );
        assert!(matches!(result, ValidationResult::ApiValidationRequired(_)));
    }

    #[tokio::test]
    async fn async_path_short_circuits_before_remote_call() {
        let counting = Arc::new(CountingApi::new(true, None));
        let service = ValidationService::new(Some(counting.clone()));
        let rule = ValidationRule::new(vec![
            item(ValidationRuleKind::NotEmpty, "empty"),
            item(api("products/check"), "rejected"),
        ]);

        let result = service
            .validate_async(
                &rule,
                Some(&StepValue::Text(" ".into())),
                &ValidationContext::default(),
            )
            .await;

        assert_eq!(result, ValidationResult::Error("empty".into()));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn accepted_remote_item_lets_later_items_run() {
        let counting = Arc::new(CountingApi::new(true, None));
        let service = ValidationService::new(Some(counting.clone()));
        let context = ValidationContext::default();

        let rule = ValidationRule::new(vec![
            item(api("bins/check"), "rejected"),
            item(ValidationRuleKind::NotEmpty, "empty"),
        ]);
        let value = StepValue::Text("A".into());
        let result = service.validate_async(&rule, Some(&value), &context).await;
        assert_eq!(result, ValidationResult::Success);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        let rule = ValidationRule::new(vec![
            item(api("bins/check"), "rejected"),
            item(regex("^Z"), "must start with Z"),
        ]);
        let result = service.validate_async(&rule, Some(&value), &context).await;
        assert_eq!(result, ValidationResult::Error("must start with Z".into()));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn remote_rejection_stops_the_remaining_items() {
        let counting = Arc::new(CountingApi::new(false, None));
        let service = ValidationService::new(Some(counting.clone()));
        let rule = ValidationRule::new(vec![
            item(api("bins/first"), "first rejected"),
            item(api("bins/second"), "second rejected"),
            item(api("bins/third"), "third rejected"),
        ]);

        let result = service
            .validate_async(
                &rule,
                Some(&StepValue::Text("A".into())),
                &ValidationContext::default(),
            )
            .await;

        assert_eq!(result, ValidationResult::Error("first rejected".into()));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn async_path_maps_remote_rejection() {
        let service =
            ValidationService::new(Some(Arc::new(CountingApi::new(false, Some("blocked bin")))));
        let rule = ValidationRule::new(vec![item(api("bins/check"), "rejected")]);
        let result = service
            .validate_async(
                &rule,
                Some(&StepValue::Bin(BinX::new("A-1"))),
                &ValidationContext::default(),
            )
            .await;
        assert_eq!(result, ValidationResult::Error("blocked bin".into()));
    }

    #[tokio::test]
    async fn async_path_without_api_is_an_error() {
        let rule = ValidationRule::new(vec![item(api("bins/check"), "rejected")]);
        let result = ValidationService::default()
            .validate_async(
                &rule,
                Some(&StepValue::Text("A".into())),
                &ValidationContext::default(),
            )
            .await;
        assert!(matches!(
            result,
            ValidationResult::Error(message) if message.contains("not configured")
        ));
    }

    #[tokio::test]
    async fn async_path_reports_port_failure() {
        let service = ValidationService::new(Some(Arc::new(BrokenApi)));
        let rule = ValidationRule::new(vec![item(api("bins/check"), "rejected")]);
        let result = service
            .validate_async(
                &rule,
                Some(&StepValue::Text("A".into())),
                &ValidationContext::default(),
            )
            .await;
        assert!(matches!(
            result,
            ValidationResult::Error(message) if message.contains("connection refused")
        ));
    }
}
