use serde_json::{Map, Value};

use crate::domain::{FieldNode, LeafField, RepeatableField};

/// Mount-time values for a whole field list.
pub fn form_defaults(fields: &[FieldNode]) -> Value {
    let mut map = Map::new();
    collect_defaults(fields, &mut map);
    Value::Object(map)
}

/// One fresh repeatable item built from the template.
pub fn item_defaults(repeatable: &RepeatableField) -> Value {
    form_defaults(&repeatable.fields)
}

pub fn leaf_default(field: &LeafField) -> Option<Value> {
    if let Some(value) = &field.default_value {
        return Some(value.clone());
    }
    if field.kind.is_multi_valued() {
        Some(Value::Array(Vec::new()))
    } else if field.kind.is_toggle() {
        Some(Value::Bool(false))
    } else {
        None
    }
}

/// Value a leaf falls back to when its dependency changes.
pub fn leaf_cleared(field: &LeafField) -> Option<Value> {
    if field.kind.is_multi_valued() {
        Some(Value::Array(Vec::new()))
    } else if field.kind.is_toggle() {
        Some(Value::Bool(false))
    } else {
        None
    }
}

pub fn repeatable_defaults(repeatable: &RepeatableField) -> Value {
    if let Some(min) = repeatable.min_items() {
        let count = min.max(1);
        return Value::Array((0..count).map(|_| item_defaults(repeatable)).collect());
    }
    match &repeatable.default_value {
        Some(Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| overlay(item_defaults(repeatable), item))
                .collect(),
        ),
        _ => Value::Array(Vec::new()),
    }
}

fn collect_defaults(fields: &[FieldNode], map: &mut Map<String, Value>) {
    for node in fields {
        match node {
            FieldNode::Leaf(field) => {
                if let Some(value) = leaf_default(field) {
                    map.insert(field.name.clone(), value);
                }
            }
            FieldNode::Section(section) => collect_defaults(&section.fields, map),
            FieldNode::Repeatable(repeatable) => {
                map.insert(repeatable.name.clone(), repeatable_defaults(repeatable));
            }
            FieldNode::DynamicFlow(_) => {}
        }
    }
}

/// Deep-merge `patch` onto `base`; objects merge key-wise, anything else replaces.
pub fn overlay(base: Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (key, value) in patch {
                let merged = match base.remove(key) {
                    Some(existing) => overlay(existing, value),
                    None => value.clone(),
                };
                base.insert(key.clone(), merged);
            }
            Value::Object(base)
        }
        (_, patch) => patch.clone(),
    }
}
