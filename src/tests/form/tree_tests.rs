use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::{
    domain::{FieldNode, FieldPath, FormConfig},
    form::{
        ValidatorRegistry,
        tree::{
            TreeValidator, leaf_paths, locate, option_bindings, owned_prefixes,
            resolve_step_fields,
        },
    },
};

fn config(value: Value) -> FormConfig {
    crate::domain::parse_form_config(&value).expect("valid configuration")
}

fn nested_config() -> FormConfig {
    config(json!({
        "title": "Profile",
        "fields": [
            {
                "type": "section",
                "name": "outer",
                "title": "Outer",
                "fields": [
                    {
                        "type": "section",
                        "name": "inner",
                        "fields": [
                            {"name": "email", "type": "email",
                             "validation": {"required": {"value": true, "message": "Email is required"}}}
                        ]
                    }
                ]
            },
            {
                "type": "repeatable",
                "name": "contacts",
                "fields": [
                    {"name": "kind", "type": "select",
                     "options": [{"value": "phone", "label": "Phone"}, {"value": "mail", "label": "Mail"}]},
                    {"name": "number", "type": "tel",
                     "showWhen": {"conditions": [{"field": "kind", "operator": "eq", "value": "phone"}]},
                     "validation": {"required": {"value": true, "message": "Number is required"}}}
                ]
            }
        ]
    }))
}

#[test]
fn sections_are_transparent_and_items_are_indexed() {
    let config = nested_config();
    let data = json!({"contacts": [{"kind": "phone"}, {"kind": "mail"}]});
    assert_eq!(
        leaf_paths(&config.fields, &data),
        vec![
            "email".to_string(),
            "contacts[0].kind".to_string(),
            "contacts[0].number".to_string(),
            "contacts[1].kind".to_string(),
            "contacts[1].number".to_string(),
        ]
    );
}

#[test]
fn locate_resolves_item_paths_with_their_context() {
    let config = nested_config();
    let path = FieldPath::parse("contacts[1].number").expect("path");
    let located = locate(&config.fields, &path).expect("located");
    assert_eq!(located.node.name(), "number");
    assert_eq!(located.context.index(), Some(1));
    assert_eq!(located.context.path_for("number").to_string(), "contacts[1].number");

    let email = FieldPath::parse("email").expect("path");
    assert!(locate(&config.fields, &email).is_some(), "found through sections");

    let bogus = FieldPath::parse("email[0].x").expect("path");
    assert!(locate(&config.fields, &bogus).is_none());
}

#[test]
fn full_validation_skips_hidden_fields() {
    let config = nested_config();
    let data = json!({
        "email": "a@b.co",
        "contacts": [{"kind": "phone"}, {"kind": "mail"}]
    });
    let flows = IndexMap::new();
    let registry = ValidatorRegistry::with_builtins();
    let errors = TreeValidator::new(&data, &registry, &flows).validate_all(&config.fields);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors.get("contacts[0].number").map(String::as_str),
        Some("Number is required")
    );
}

#[test]
fn repeatable_count_is_checked_on_its_own_path() {
    let config = config(json!({
        "fields": [{
            "type": "repeatable",
            "name": "guests",
            "validation": {"min": {"value": 2, "message": "Invite two guests"}},
            "fields": [{"name": "name"}]
        }]
    }));
    let data = json!({"guests": [{"name": "Ada"}]});
    let flows = IndexMap::new();
    let registry = ValidatorRegistry::with_builtins();
    let errors = TreeValidator::new(&data, &registry, &flows).validate_all(&config.fields);
    assert_eq!(errors.get("guests").map(String::as_str), Some("Invite two guests"));
}

#[test]
fn option_bindings_resolve_dependencies_and_params() {
    let config = config(json!({
        "fields": [
            {"name": "country", "type": "select", "options": []},
            {"name": "locale", "type": "text"},
            {"name": "state", "type": "select",
             "optionsSource": {"function": "getStates", "dependsOn": "country", "params": ["locale"]}},
            {"name": "tags", "type": "multi-select",
             "optionsSource": {"function": "getTags"}}
        ]
    }));

    let empty = json!({});
    let bindings = option_bindings(&config.fields, &empty);
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].path, "state");
    assert_eq!(bindings[0].args, None, "dependency absent");
    assert_eq!(bindings[1].args, Some(vec![]));

    let filled = json!({"country": "us", "locale": "en"});
    let bindings = option_bindings(&config.fields, &filled);
    assert_eq!(bindings[0].args, Some(vec![json!("us"), json!("en")]));
    assert_eq!(bindings[0].dependencies, vec!["country".to_string()]);
}

#[test]
fn step_fields_resolve_by_name_and_own_their_prefixes() {
    let config = nested_config();
    let names = vec!["outer".to_string(), "contacts".to_string(), "ghost".to_string()];
    let nodes = resolve_step_fields(&config.fields, &names);
    assert_eq!(nodes.len(), 2);
    assert!(matches!(nodes[0], FieldNode::Section(_)));
    assert_eq!(
        owned_prefixes(&nodes),
        vec!["email".to_string(), "contacts".to_string()]
    );
}
