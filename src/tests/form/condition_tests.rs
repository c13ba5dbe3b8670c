use serde_json::{Value, json};

use crate::{
    domain::{FieldPath, ShowWhen},
    form::{ValueScope, evaluate, should_show},
};

fn group(value: Value) -> ShowWhen {
    serde_json::from_value(value).expect("valid showWhen")
}

#[test]
fn and_group_requires_every_condition() {
    let data = json!({"plan": "pro", "seats": 12});
    let scope = ValueScope::global(&data);
    let both = group(json!({
        "conditions": [
            {"field": "plan", "operator": "eq", "value": "pro"},
            {"field": "seats", "operator": "gt", "value": 10}
        ]
    }));
    assert!(evaluate(&both, &scope));

    let failing = group(json!({
        "conditions": [
            {"field": "plan", "operator": "eq", "value": "pro"},
            {"field": "seats", "operator": "lt", "value": 10}
        ]
    }));
    assert!(!evaluate(&failing, &scope));
}

#[test]
fn or_group_needs_one_match() {
    let data = json!({"role": "viewer"});
    let scope = ValueScope::global(&data);
    let either = group(json!({
        "logic": "or",
        "conditions": [
            {"field": "role", "operator": "eq", "value": "admin"},
            {"field": "role", "operator": "in", "value": ["viewer", "editor"]}
        ]
    }));
    assert!(evaluate(&either, &scope));
}

#[test]
fn empty_groups_follow_their_logic() {
    let data = json!({});
    let scope = ValueScope::global(&data);
    assert!(evaluate(&group(json!({"conditions": []})), &scope));
    assert!(!evaluate(&group(json!({"logic": "or", "conditions": []})), &scope));
    assert!(should_show(None, &scope), "absent showWhen is always visible");
}

#[test]
fn numeric_comparisons_coerce_strings_and_reject_text() {
    let data = json!({"age": "21", "nickname": "ace"});
    let scope = ValueScope::global(&data);
    assert!(evaluate(
        &group(json!({"conditions": [{"field": "age", "operator": "gte", "value": 18}]})),
        &scope
    ));
    assert!(!evaluate(
        &group(json!({"conditions": [{"field": "nickname", "operator": "gt", "value": 1}]})),
        &scope
    ));
}

#[test]
fn in_with_scalar_operand_is_false_and_not_in_is_true() {
    let data = json!({"color": "red"});
    let scope = ValueScope::global(&data);
    assert!(!evaluate(
        &group(json!({"conditions": [{"field": "color", "operator": "in", "value": "red"}]})),
        &scope
    ));
    assert!(evaluate(
        &group(json!({"conditions": [{"field": "color", "operator": "notIn", "value": "red"}]})),
        &scope
    ));
}

#[test]
fn unknown_operator_passes() {
    let data = json!({"color": "red"});
    let scope = ValueScope::global(&data);
    assert!(evaluate(
        &group(json!({"conditions": [{"field": "color", "operator": "matches", "value": "r.*"}]})),
        &scope
    ));
}

#[test]
fn missing_field_only_equals_null() {
    let data = json!({});
    let scope = ValueScope::global(&data);
    assert!(!evaluate(
        &group(json!({"conditions": [{"field": "ghost", "operator": "eq", "value": "x"}]})),
        &scope
    ));
    assert!(evaluate(
        &group(json!({"conditions": [{"field": "ghost", "operator": "neq", "value": "x"}]})),
        &scope
    ));
    assert!(evaluate(
        &group(json!({"conditions": [{"field": "ghost", "operator": "isFalsy"}]})),
        &scope
    ));
}

#[test]
fn item_scope_shadows_root_values() {
    let data = json!({
        "kind": "global",
        "contacts": [
            {"kind": "phone"},
            {"name": "no kind here"}
        ]
    });
    let first = FieldPath::parse("contacts[0]").expect("path");
    let second = FieldPath::parse("contacts[1]").expect("path");
    let is_phone = group(json!({
        "conditions": [{"field": "kind", "operator": "eq", "value": "phone"}]
    }));

    assert!(evaluate(&is_phone, &ValueScope::within(&data, &[first])));
    // Falls back to the root value when the item lacks the key.
    let fallback = ValueScope::within(&data, &[second]);
    assert!(!evaluate(&is_phone, &fallback));
    assert_eq!(fallback.lookup("kind"), Some(&json!("global")));
}

#[test]
fn equality_is_strict_across_types() {
    let data = json!({"count": 3, "flag": true});
    let scope = ValueScope::global(&data);
    assert!(evaluate(
        &group(json!({"conditions": [
            {"field": "count", "operator": "eq", "value": 3.0},
            {"field": "flag", "operator": "isTruthy"}
        ]})),
        &scope
    ));
    assert!(!evaluate(
        &group(json!({"conditions": [{"field": "count", "operator": "eq", "value": "3"}]})),
        &scope
    ));
}
