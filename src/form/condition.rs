use log::warn;
use serde_json::Value;

use crate::domain::{Condition, ConditionLogic, ConditionOperator, FieldPath, ShowWhen};

use super::convert::{as_number, is_truthy, values_equal};

/// Read-only view of form data as seen from one node.
///
/// Lookups try the enclosing repeatable items first (innermost outward) and
/// then fall back to the whole form by the same path.
#[derive(Debug, Clone)]
pub struct ValueScope<'a> {
    root: &'a Value,
    items: Vec<&'a Value>,
}

impl<'a> ValueScope<'a> {
    pub fn global(root: &'a Value) -> Self {
        Self {
            root,
            items: Vec::new(),
        }
    }

    /// `items` are the enclosing repeatable item paths, outermost first.
    pub fn within(root: &'a Value, items: &[FieldPath]) -> Self {
        let items = items
            .iter()
            .rev()
            .filter_map(|path| path.get(root))
            .collect();
        Self { root, items }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    pub fn item(&self) -> Option<&'a Value> {
        self.items.first().copied()
    }

    pub fn lookup(&self, raw: &str) -> Option<&'a Value> {
        let path = FieldPath::parse(raw).ok()?;
        self.items
            .iter()
            .find_map(|item| path.get(item))
            .or_else(|| path.get(self.root))
    }
}

/// Evaluate a flat condition group.
pub fn evaluate(group: &ShowWhen, scope: &ValueScope<'_>) -> bool {
    let mut results = group
        .conditions
        .iter()
        .map(|condition| check_condition(condition, scope));
    match group.logic {
        ConditionLogic::And => results.all(|passed| passed),
        ConditionLogic::Or => results.any(|passed| passed),
    }
}

/// Visibility of a node: no `showWhen` means always shown.
pub fn should_show(show_when: Option<&ShowWhen>, scope: &ValueScope<'_>) -> bool {
    show_when.map_or(true, |group| evaluate(group, scope))
}

pub fn check_condition(condition: &Condition, scope: &ValueScope<'_>) -> bool {
    let actual = scope.lookup(&condition.field);
    let expected = &condition.value;
    let null = Value::Null;
    let current = actual.unwrap_or(&null);

    match &condition.operator {
        ConditionOperator::Eq => values_equal(current, expected),
        ConditionOperator::Neq => !values_equal(current, expected),
        ConditionOperator::In => match expected {
            Value::Array(candidates) => candidates.iter().any(|c| values_equal(current, c)),
            _ => {
                warn!(
                    "condition on '{}' uses 'in' with a non-array operand",
                    condition.field
                );
                false
            }
        },
        ConditionOperator::NotIn => match expected {
            Value::Array(candidates) => !candidates.iter().any(|c| values_equal(current, c)),
            _ => {
                warn!(
                    "condition on '{}' uses 'notIn' with a non-array operand",
                    condition.field
                );
                true
            }
        },
        ConditionOperator::Gt => compare(current, expected, |a, b| a > b),
        ConditionOperator::Lt => compare(current, expected, |a, b| a < b),
        ConditionOperator::Gte => compare(current, expected, |a, b| a >= b),
        ConditionOperator::Lte => compare(current, expected, |a, b| a <= b),
        ConditionOperator::IsTruthy => is_truthy(actual),
        ConditionOperator::IsFalsy => !is_truthy(actual),
        ConditionOperator::Unknown(name) => {
            warn!("unsupported condition operator '{name}' on '{}'", condition.field);
            true
        }
    }
}

fn compare(current: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(current), as_number(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}
