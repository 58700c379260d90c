//! Pure ordering predicates over planned actions.
//!
//! Each function takes a filter selecting the actions it reasons about
//! (e.g. only initial actions). The validators wrap these in their caches.

use crate::model::PlannedAction;

/// Returns `true` when every action selected by `filter` is completed or skipped.
pub fn all_completed(actions: &[PlannedAction], filter: impl Fn(&PlannedAction) -> bool) -> bool {
    actions.iter().filter(|action| filter(action)).all(|action| !action.is_pending())
}

/// Returns the pending action with the lowest order among those selected by `filter`.
pub fn next_incomplete(
    actions: &[PlannedAction],
    filter: impl Fn(&PlannedAction) -> bool,
) -> Option<&PlannedAction> {
    actions
        .iter()
        .filter(|action| filter(action) && action.is_pending())
        .min_by_key(|action| action.order)
}

/// Returns `true` when another selected action with a lower order is still pending.
///
/// An unknown action, or one the filter does not select, is never out of order.
pub fn is_out_of_order(
    actions: &[PlannedAction],
    action_id: &str,
    filter: impl Fn(&PlannedAction) -> bool,
) -> bool {
    let Some(target) = actions.iter().find(|action| action.id == action_id) else {
        return false;
    };
    if !filter(target) {
        return false;
    }
    actions.iter().any(|other| {
        other.id != target.id && filter(other) && other.is_pending() && other.order < target.order
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{action, completed, skipped};

    #[test]
    fn next_incomplete_picks_lowest_pending_order() {
        let actions = vec![action("c", 30), completed(action("a", 10)), action("b", 20)];
        assert_eq!(next_incomplete(&actions, |_| true).map(|a| a.id.as_str()), Some("b"));
    }

    #[test]
    fn next_incomplete_ignores_skipped_and_returns_none_when_done() {
        let actions = vec![skipped(action("a", 1)), completed(action("b", 2))];
        assert!(next_incomplete(&actions, |_| true).is_none());
        assert!(all_completed(&actions, |_| true));
    }

    #[test]
    fn out_of_order_when_lower_order_is_pending() {
        let actions = vec![action("a", 1), action("b", 2)];
        assert!(is_out_of_order(&actions, "b", |_| true));
        assert!(!is_out_of_order(&actions, "a", |_| true));
    }

    #[test]
    fn unmatched_action_is_never_out_of_order() {
        let actions = vec![action("a", 1), action("b", 2)];
        assert!(!is_out_of_order(&actions, "b", |a| a.id == "a"));
        assert!(!is_out_of_order(&actions, "missing", |_| true));
    }
}
