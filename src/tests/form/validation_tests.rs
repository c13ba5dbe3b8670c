use serde_json::{Value, json};

use crate::{
    domain::{LeafField, ValidationRuleSet},
    form::{
        ValidatorRegistry, ValueScope, password_strength, validate, validation::validate_leaf,
    },
};

fn rules(value: Value) -> ValidationRuleSet {
    serde_json::from_value(value).expect("valid rule set")
}

fn check(rules: &ValidationRuleSet, numeric: bool, value: Option<&Value>) -> Option<String> {
    let data = json!({});
    validate(
        rules,
        numeric,
        value,
        &ValueScope::global(&data),
        &ValidatorRegistry::with_builtins(),
    )
}

#[test]
fn required_wins_over_pattern() {
    let rules = rules(json!({
        "required": {"value": true, "message": "Email is required"},
        "pattern": {"value": "^\\S+@\\S+$", "message": "Invalid email"}
    }));
    assert_eq!(
        check(&rules, false, Some(&json!(""))).as_deref(),
        Some("Email is required")
    );
    assert_eq!(
        check(&rules, false, Some(&json!("nope"))).as_deref(),
        Some("Invalid email")
    );
    assert_eq!(check(&rules, false, Some(&json!("a@b.co"))), None);
}

#[test]
fn whitespace_and_empty_lists_count_as_missing() {
    let rules = rules(json!({"required": {"value": true, "message": "Pick one"}}));
    assert!(check(&rules, false, Some(&json!("   "))).is_some());
    assert!(check(&rules, false, Some(&json!([]))).is_some());
    assert!(check(&rules, false, None).is_some());
    assert_eq!(check(&rules, false, Some(&json!(["a"]))), None);
    assert_eq!(check(&rules, false, Some(&json!(false))), None);
}

#[test]
fn disabled_required_rule_is_ignored() {
    let rules = rules(json!({"required": {"value": false, "message": "never"}}));
    assert_eq!(check(&rules, false, None), None);
}

#[test]
fn required_rule_without_value_is_ignored() {
    let missing = rules(json!({"required": {"message": "never"}}));
    assert_eq!(check(&missing, false, None), None);
    let null = rules(json!({"required": {"value": null, "message": "never"}}));
    assert_eq!(check(&null, false, Some(&json!(""))), None);
}

#[test]
fn length_rules_count_characters_and_skip_empty_values() {
    let rules = rules(json!({
        "minLength": {"value": 3, "message": "Too short"},
        "maxLength": {"value": 5, "message": "Too long"}
    }));
    assert_eq!(check(&rules, false, Some(&json!(""))), None);
    assert_eq!(check(&rules, false, Some(&json!("ab"))).as_deref(), Some("Too short"));
    assert_eq!(check(&rules, false, Some(&json!("ééé"))), None);
    assert_eq!(check(&rules, false, Some(&json!("abcdef"))).as_deref(), Some("Too long"));
}

#[test]
fn range_rules_apply_to_numeric_kinds_only() {
    let rules = rules(json!({
        "min": {"value": 18, "message": "Too young"},
        "max": {"value": 120, "message": "Too old"}
    }));
    assert_eq!(check(&rules, true, Some(&json!(17))).as_deref(), Some("Too young"));
    assert_eq!(check(&rules, true, Some(&json!("121"))).as_deref(), Some("Too old"));
    assert_eq!(check(&rules, true, Some(&json!(40))), None);
    assert_eq!(check(&rules, false, Some(&json!(3))), None);
}

#[test]
fn lookahead_patterns_are_enforced() {
    let rules = rules(json!({
        "pattern": {
            "value": "^(?=.*[a-z])(?=.*[A-Z])(?=.*\\d)(?=.*[!@#$%^&*(),.?\":{}|<>]).{8,}$",
            "message": "weak"
        }
    }));
    assert_eq!(check(&rules, false, Some(&json!("abc"))).as_deref(), Some("weak"));
    assert_eq!(check(&rules, false, Some(&json!("abcdefgh1!"))).as_deref(), Some("weak"));
    assert_eq!(check(&rules, false, Some(&json!("Abcdefg1!"))), None);
}

#[test]
fn malformed_pattern_passes() {
    let rules = rules(json!({"pattern": {"value": "([a-z", "message": "bad"}}));
    assert_eq!(check(&rules, false, Some(&json!("anything"))), None);
}

#[test]
fn custom_rule_message_overrides_validator_message() {
    let with_message = rules(json!({
        "custom": {"function": "validateFullName", "message": "First and last name, please"}
    }));
    assert_eq!(
        check(&with_message, false, Some(&json!("Ada"))).as_deref(),
        Some("First and last name, please")
    );
    let without_message = rules(json!({"custom": {"function": "validateFullName"}}));
    assert_eq!(
        check(&without_message, false, Some(&json!("Ada"))).as_deref(),
        Some("Please enter both first and last name.")
    );
    assert_eq!(check(&without_message, false, Some(&json!("Ada Lovelace"))), None);
}

#[test]
fn unregistered_custom_validator_passes() {
    let rules = rules(json!({"custom": {"function": "doesNotExist", "message": "x"}}));
    assert_eq!(check(&rules, false, Some(&json!("value"))), None);
}

#[test]
fn password_match_reads_the_password_field() {
    let rules = rules(json!({"custom": {"function": "validatePasswordMatch"}}));
    let data = json!({"password": "Abc123!!"});
    let scope = ValueScope::global(&data);
    let registry = ValidatorRegistry::with_builtins();
    assert_eq!(
        validate(&rules, false, Some(&json!("different")), &scope, &registry).as_deref(),
        Some("Passwords do not match.")
    );
    assert_eq!(
        validate(&rules, false, Some(&json!("Abc123!!")), &scope, &registry),
        None
    );
}

#[test]
fn password_strength_validator_needs_all_classes() {
    let rules = rules(json!({"custom": {"function": "validatePasswordStrength"}}));
    assert!(check(&rules, false, Some(&json!("abcdefgh"))).is_some());
    assert!(check(&rules, false, Some(&json!("Abcdefg1"))).is_some());
    assert_eq!(check(&rules, false, Some(&json!("Abcdef1!"))), None);
}

#[test]
fn luhn_validator_accepts_known_card_numbers() {
    let rules = rules(json!({"custom": {"function": "luhnCheck"}}));
    assert_eq!(check(&rules, false, Some(&json!("4111 1111 1111 1111"))), None);
    assert!(check(&rules, false, Some(&json!("4111 1111 1111 1112"))).is_some());
    assert_eq!(check(&rules, false, Some(&json!(""))), None);
}

#[test]
fn host_registered_validator_sees_other_values() {
    let mut registry = ValidatorRegistry::empty();
    registry.register("notSameAsUsername", |value, scope| {
        (scope.lookup("username") == Some(value)).then(|| "Too predictable".to_string())
    });
    let rules = rules(json!({"custom": {"function": "notSameAsUsername"}}));
    let data = json!({"username": "ada"});
    let scope = ValueScope::global(&data);
    assert_eq!(
        validate(&rules, false, Some(&json!("ada")), &scope, &registry).as_deref(),
        Some("Too predictable")
    );
}

#[test]
fn cross_rules_run_after_the_rule_set() {
    let field: LeafField = serde_json::from_value(json!({
        "name": "endDate",
        "type": "date",
        "validation": {"required": {"value": true, "message": "End date is required"}},
        "crossValidation": [
            {"rule": "isAfter", "dependsOn": ["startDate"], "message": "End must follow start"}
        ]
    }))
    .expect("leaf field");
    let registry = ValidatorRegistry::with_builtins();

    let empty = json!({"startDate": "2024-05-01"});
    assert_eq!(
        validate_leaf(&field, "endDate", None, &ValueScope::global(&empty), &registry).as_deref(),
        Some("End date is required")
    );

    let early = json!({"startDate": "2024-05-01", "endDate": "2024-04-30"});
    assert_eq!(
        validate_leaf(
            &field,
            "endDate",
            early.get("endDate"),
            &ValueScope::global(&early),
            &registry
        )
        .as_deref(),
        Some("End must follow start")
    );

    let late = json!({"startDate": "2024-05-01", "endDate": "2024-05-02"});
    assert_eq!(
        validate_leaf(
            &field,
            "endDate",
            late.get("endDate"),
            &ValueScope::global(&late),
            &registry
        ),
        None
    );
}

#[test]
fn strength_meter_scores_each_criterion() {
    assert_eq!(password_strength("", 8).label, "No password");
    assert_eq!(password_strength("abc", 8).score, 1);
    let strong = password_strength("Abcdef1!", 8);
    assert_eq!(strong.score, 5);
    assert_eq!(strong.label, "Very Strong");
}
