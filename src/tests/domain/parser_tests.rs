use serde_json::json;

use crate::domain::{FieldNode, FormConfig, LeafKind, parse_form_config};

#[test]
fn parses_every_node_shape() {
    let config = parse_form_config(&json!({
        "title": "Everything",
        "fields": [
            {"name": "plain"},
            {"type": "section", "name": "box", "fields": [{"name": "inner", "type": "number"}]},
            {"type": "repeatable", "name": "rows", "fields": [{"name": "cell"}]},
            {"type": "dynamic-flow", "name": "pick", "outputStepId": "b", "flow": [
                {"id": "a", "optionsSource": {"functionName": "getA"}},
                {"id": "b", "optionsSource": {"function": "getB", "dependsOn": "a"}}
            ]},
            {"name": "odd", "type": "hologram"}
        ]
    }))
    .expect("config parses");

    assert!(matches!(&config.fields[0], FieldNode::Leaf(leaf) if leaf.kind == LeafKind::Text));
    assert!(matches!(&config.fields[1], FieldNode::Section(section) if section.fields.len() == 1));
    assert!(matches!(&config.fields[2], FieldNode::Repeatable(_)));
    match &config.fields[3] {
        FieldNode::DynamicFlow(flow) => {
            assert_eq!(flow.flow[0].options_source.function, "getA");
            assert_eq!(flow.step_index("b"), Some(1));
        }
        other => panic!("expected a flow, got {other:?}"),
    }
    assert!(matches!(
        &config.fields[4],
        FieldNode::Leaf(leaf) if leaf.kind == LeafKind::Unsupported("hologram".into())
    ));
}

#[test]
fn envelope_errors_name_the_offending_location() {
    let err = parse_form_config(&json!({"fields": [{"label": "no name"}]}))
        .expect_err("missing name is rejected");
    let message = format!("{err:#}");
    assert!(message.contains("/fields/0"), "{message}");

    let err = parse_form_config(&json!({
        "fields": [{"type": "dynamic-flow", "name": "f", "flow": []}]
    }))
    .expect_err("flow without outputStepId is rejected");
    assert!(format!("{err:#}").contains("outputStepId"));
}

#[test]
fn wizard_needs_steps_to_count_as_one() {
    let config = FormConfig::from_json_str(r#"{"type": "wizard", "fields": []}"#).expect("config");
    assert!(!config.is_wizard());

    let config = FormConfig::from_json_str(
        r#"{"type": "wizard", "steps": [{"id": "s", "fields": []}], "fields": []}"#,
    )
    .expect("config");
    assert!(config.is_wizard());
}

#[test]
fn rejects_malformed_json() {
    assert!(FormConfig::from_json_str("{ not json").is_err());
}
