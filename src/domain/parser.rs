use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use jsonschema::validator_for;
use log::warn;
use serde_json::{Value, json};

use super::schema::{FieldNode, FormConfig};

/// Structural envelope every configuration must satisfy before it is
/// deserialized. Field `type` strings are not enumerated here: unknown leaf
/// kinds degrade to a placeholder instead of failing the load.
fn envelope_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": {
            "rule": {
                "type": "object",
                "properties": { "message": { "type": "string" } }
            },
            "optionsSource": {
                "type": "object",
                "anyOf": [
                    { "required": ["function"] },
                    { "required": ["functionName"] }
                ],
                "properties": {
                    "function": { "type": "string" },
                    "functionName": { "type": "string" },
                    "dependsOn": {
                        "anyOf": [
                            { "type": "string" },
                            { "type": "array", "items": { "type": "string" } }
                        ]
                    },
                    "params": { "type": "array", "items": { "type": "string" } }
                }
            },
            "showWhen": {
                "type": "object",
                "required": ["conditions"],
                "properties": {
                    "logic": { "type": "string" },
                    "conditions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["field", "operator"],
                            "properties": {
                                "field": { "type": "string" },
                                "operator": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "field": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string" },
                    "type": { "type": "string" },
                    "validation": {
                        "type": "object",
                        "additionalProperties": { "$ref": "#/definitions/rule" }
                    },
                    "showWhen": { "$ref": "#/definitions/showWhen" },
                    "optionsSource": { "$ref": "#/definitions/optionsSource" },
                    "fields": { "type": "array", "items": { "$ref": "#/definitions/field" } },
                    "flow": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["id", "optionsSource"],
                            "properties": {
                                "id": { "type": "string" },
                                "optionsSource": { "$ref": "#/definitions/optionsSource" }
                            }
                        }
                    }
                },
                "allOf": [
                    {
                        "if": { "properties": { "type": { "const": "dynamic-flow" } }, "required": ["type"] },
                        "then": { "required": ["flow", "outputStepId"] }
                    }
                ]
            }
        },
        "type": "object",
        "required": ["fields"],
        "properties": {
            "title": { "type": "string" },
            "description": { "type": "string" },
            "type": { "enum": ["standard", "wizard"] },
            "steps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "fields"],
                    "properties": {
                        "id": { "type": "string" },
                        "title": { "type": "string" },
                        "fields": { "type": "array", "items": { "type": "string" } }
                    }
                }
            },
            "fields": { "type": "array", "items": { "$ref": "#/definitions/field" } }
        }
    })
}

/// Validate and deserialize a JSON form configuration.
pub fn parse_form_config(value: &Value) -> Result<FormConfig> {
    let schema = envelope_schema();
    let validator = validator_for(&schema).context("form envelope schema failed to compile")?;

    let issues: Vec<String> = validator
        .iter_errors(value)
        .map(|error| {
            let pointer = error.instance_path.to_string();
            let prefix = if pointer.is_empty() {
                "<root>".to_string()
            } else {
                pointer
            };
            format!("{prefix}: {error}")
        })
        .collect();
    if !issues.is_empty() {
        bail!("form configuration is malformed:\n  {}", issues.join("\n  "));
    }

    let config: FormConfig = serde_json::from_value(value.clone())
        .context("form configuration does not match the field schema")?;
    lint_config(&config);
    Ok(config)
}

impl FormConfig {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(contents).context("failed to parse form configuration JSON")?;
        parse_form_config(&value)
    }
}

/// Report configuration smells that do not prevent mounting.
fn lint_config(config: &FormConfig) {
    lint_siblings(&config.fields, "<root>", &mut HashSet::new());
    if config.is_wizard() {
        for step in &config.steps {
            for name in &step.fields {
                if crate::form::tree::find_by_name(&config.fields, name).is_none() {
                    warn!("step '{}' lists unknown field '{name}'", step.id);
                }
            }
        }
    }
}

// Sections share their parent's namespace, so they reuse `seen`.
fn lint_siblings(fields: &[FieldNode], parent: &str, seen: &mut HashSet<String>) {
    for node in fields {
        if let FieldNode::Section(section) = node {
            lint_siblings(&section.fields, parent, seen);
            continue;
        }
        if !seen.insert(node.name().to_string()) {
            warn!("duplicate field name '{}' under {parent}", node.name());
        }
        match node {
            FieldNode::Section(_) | FieldNode::Leaf(_) => {}
            FieldNode::Repeatable(field) => {
                lint_siblings(&field.fields, &field.name, &mut HashSet::new())
            }
            FieldNode::DynamicFlow(field) => {
                if field.step_index(&field.output_step_id).is_none() {
                    warn!(
                        "flow '{}' names missing output step '{}'",
                        field.name, field.output_step_id
                    );
                }
            }
        }
    }
}
