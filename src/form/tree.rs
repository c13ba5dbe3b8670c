use indexmap::IndexMap;
use log::warn;
use serde_json::Value;

use crate::domain::{DynamicFlowField, FieldNode, FieldPath, LeafField, RepeatableField, Segment};

use super::{
    condition::{ValueScope, should_show},
    convert::is_missing,
    flow::{FlowState, missing_required},
    state::ErrorMap,
    validation::{ValidatorRegistry, validate, validate_leaf},
};

/// Where a node lives: the path prefix its name is appended to and the
/// repeatable items enclosing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeContext {
    pub parent: FieldPath,
    pub items: Vec<FieldPath>,
}

impl NodeContext {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn path_for(&self, name: &str) -> FieldPath {
        if self.parent.is_empty() {
            FieldPath::key(name)
        } else {
            self.parent.child(name)
        }
    }

    pub fn enter_item(&self, repeatable: &FieldPath, index: usize) -> Self {
        let item = repeatable.item(index);
        let mut items = self.items.clone();
        items.push(item.clone());
        Self {
            parent: item,
            items,
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.items.last().and_then(|item| match item.segments().last() {
            Some(Segment::Index(index)) => Some(*index),
            _ => None,
        })
    }

    pub fn scope<'a>(&self, data: &'a Value) -> ValueScope<'a> {
        ValueScope::within(data, &self.items)
    }
}

/// Find a node by name among siblings, looking through sections.
pub fn find_by_name<'a>(fields: &'a [FieldNode], name: &str) -> Option<&'a FieldNode> {
    for node in fields {
        if node.name() == name {
            return Some(node);
        }
        if let FieldNode::Section(section) = node
            && let Some(found) = find_by_name(&section.fields, name)
        {
            return Some(found);
        }
    }
    None
}

#[derive(Debug, Clone)]
pub struct Located<'a> {
    pub node: &'a FieldNode,
    pub context: NodeContext,
}

/// Resolve a canonical path to the node that owns it.
pub fn locate<'a>(fields: &'a [FieldNode], path: &FieldPath) -> Option<Located<'a>> {
    let mut current = fields;
    let mut context = NodeContext::root();
    let mut segments = path.segments().iter().peekable();

    while let Some(segment) = segments.next() {
        let Segment::Key(name) = segment else {
            return None;
        };
        let node = find_by_name(current, name)?;
        match (node, segments.peek()) {
            (_, None) => return Some(Located { node, context }),
            (FieldNode::Repeatable(repeatable), Some(Segment::Index(index))) => {
                let repeatable_path = context.path_for(&repeatable.name);
                context = context.enter_item(&repeatable_path, *index);
                current = &repeatable.fields;
                segments.next();
            }
            _ => return None,
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    VisibleOnly,
}

#[derive(Debug, Clone)]
pub struct NodeVisit<'a> {
    pub node: &'a FieldNode,
    pub path: FieldPath,
    pub context: NodeContext,
}

/// Depth-first walk over nodes, descending into sections and into every
/// current item of each repeatable. Hidden subtrees are skipped under
/// `Visibility::VisibleOnly`.
pub fn visit<'a>(
    fields: &'a [FieldNode],
    context: &NodeContext,
    data: &Value,
    visibility: Visibility,
    visitor: &mut dyn FnMut(NodeVisit<'a>),
) {
    for node in fields {
        visit_node(node, context, data, visibility, visitor);
    }
}

pub fn visit_node<'a>(
    node: &'a FieldNode,
    context: &NodeContext,
    data: &Value,
    visibility: Visibility,
    visitor: &mut dyn FnMut(NodeVisit<'a>),
) {
    if visibility == Visibility::VisibleOnly && !should_show(node.show_when(), &context.scope(data))
    {
        return;
    }
    let path = match node {
        FieldNode::Section(_) => context.parent.clone(),
        _ => context.path_for(node.name()),
    };
    visitor(NodeVisit {
        node,
        path: path.clone(),
        context: context.clone(),
    });
    match node {
        FieldNode::Section(section) => visit(&section.fields, context, data, visibility, visitor),
        FieldNode::Repeatable(repeatable) => {
            for index in 0..item_count(&path, data) {
                let item_context = context.enter_item(&path, index);
                visit(&repeatable.fields, &item_context, data, visibility, visitor);
            }
        }
        FieldNode::Leaf(_) | FieldNode::DynamicFlow(_) => {}
    }
}

pub fn item_count(path: &FieldPath, data: &Value) -> usize {
    path.get(data)
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}

/// First `[index]` in `path` that addresses no existing item, as the
/// repeatable's path and the offending index.
pub fn missing_item(path: &FieldPath, data: &Value) -> Option<(FieldPath, usize)> {
    let mut prefix = FieldPath::default();
    for segment in path.segments() {
        match segment {
            Segment::Key(name) => prefix = prefix.child(name.clone()),
            Segment::Index(index) => {
                if *index >= item_count(&prefix, data) {
                    return Some((prefix, *index));
                }
                prefix = prefix.item(*index);
            }
        }
    }
    None
}

/// Resolve the top-level names a wizard step lists.
pub fn resolve_step_fields<'a>(fields: &'a [FieldNode], names: &[String]) -> Vec<&'a FieldNode> {
    names
        .iter()
        .filter_map(|name| {
            let found = find_by_name(fields, name);
            if found.is_none() {
                warn!("wizard step lists unknown field '{name}'");
            }
            found
        })
        .collect()
}

/// Error-map keys a set of top-level nodes owns; sections contribute their
/// children's names.
pub fn owned_prefixes(nodes: &[&FieldNode]) -> Vec<String> {
    let mut prefixes = Vec::new();
    for node in nodes {
        match node {
            FieldNode::Section(section) => {
                let children: Vec<&FieldNode> = section.fields.iter().collect();
                prefixes.extend(owned_prefixes(&children));
            }
            other => prefixes.push(other.name().to_string()),
        }
    }
    prefixes
}

/// Full-tree (or subset) validation against one data snapshot.
pub struct TreeValidator<'a> {
    data: &'a Value,
    registry: &'a ValidatorRegistry,
    flows: &'a IndexMap<String, FlowState>,
}

impl<'a> TreeValidator<'a> {
    pub fn new(
        data: &'a Value,
        registry: &'a ValidatorRegistry,
        flows: &'a IndexMap<String, FlowState>,
    ) -> Self {
        Self {
            data,
            registry,
            flows,
        }
    }

    pub fn validate_all(&self, fields: &[FieldNode]) -> ErrorMap {
        let mut errors = ErrorMap::new();
        visit(
            fields,
            &NodeContext::root(),
            self.data,
            Visibility::VisibleOnly,
            &mut |visit| self.check(&visit, &mut errors),
        );
        errors
    }

    pub fn validate_nodes(&self, nodes: &[&FieldNode]) -> ErrorMap {
        let mut errors = ErrorMap::new();
        for node in nodes.iter().copied() {
            visit_node(
                node,
                &NodeContext::root(),
                self.data,
                Visibility::VisibleOnly,
                &mut |visit| self.check(&visit, &mut errors),
            );
        }
        errors
    }

    /// Errors produced by one node alone, without descending into items.
    pub fn validate_located(&self, located: &Located<'_>) -> ErrorMap {
        let mut errors = ErrorMap::new();
        if !should_show(located.node.show_when(), &located.context.scope(self.data)) {
            return errors;
        }
        let path = located.context.path_for(located.node.name());
        self.check(
            &NodeVisit {
                node: located.node,
                path,
                context: located.context.clone(),
            },
            &mut errors,
        );
        errors
    }

    fn check(&self, visit: &NodeVisit<'_>, errors: &mut ErrorMap) {
        let scope = visit.context.scope(self.data);
        let key = visit.path.to_string();
        match visit.node {
            FieldNode::Leaf(field) => {
                let value = visit.path.get(self.data);
                if let Some(message) = validate_leaf(field, &key, value, &scope, self.registry) {
                    errors.insert(key, message);
                }
            }
            FieldNode::Section(_) => {}
            FieldNode::Repeatable(repeatable) => {
                let count = item_count(&visit.path, self.data);
                if let Some(message) = repeatable_count_error(repeatable, count) {
                    errors.insert(key, message);
                }
            }
            FieldNode::DynamicFlow(flow) => self.check_flow(flow, visit, &scope, errors),
        }
    }

    fn check_flow(
        &self,
        field: &DynamicFlowField,
        visit: &NodeVisit<'_>,
        scope: &ValueScope<'_>,
        errors: &mut ErrorMap,
    ) {
        let key = visit.path.to_string();
        for (step_id, message) in missing_required(field, self.flows.get(&key)) {
            errors.insert(format!("{key}.{step_id}"), message);
        }
        if let Some(rules) = &field.validation
            && let Some(message) =
                validate(rules, false, visit.path.get(self.data), scope, self.registry)
        {
            errors.insert(key, message);
        }
    }
}

/// Count-bound check for a repeatable, reported on its own path.
pub fn repeatable_count_error(repeatable: &RepeatableField, count: usize) -> Option<String> {
    let rules = repeatable.validation.as_ref();
    if let Some(rule) = rules.and_then(|rules| rules.required.as_ref())
        && rule.is_enabled()
        && count == 0
    {
        return Some(if rule.message.is_empty() {
            "Add at least one item.".to_string()
        } else {
            rule.message.clone()
        });
    }
    if let Some(min) = repeatable.min_items()
        && count < min
    {
        return Some(min_items_message(repeatable, min));
    }
    if let Some(max) = repeatable.max_item_count()
        && count > max
    {
        return Some(max_items_message(repeatable, max));
    }
    None
}

pub fn min_items_message(repeatable: &RepeatableField, min: usize) -> String {
    repeatable
        .validation
        .as_ref()
        .and_then(|rules| rules.min.as_ref())
        .map(|rule| rule.message.clone())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("At least {min} item(s) required."))
}

pub fn max_items_message(repeatable: &RepeatableField, max: usize) -> String {
    repeatable
        .validation
        .as_ref()
        .and_then(|rules| rules.max.as_ref())
        .map(|rule| rule.message.clone())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("No more than {max} item(s) allowed."))
}

/// A visible choice leaf fed by an options source, with its resolved
/// arguments (`None` when a dependency is absent).
#[derive(Debug, Clone)]
pub struct OptionBinding<'a> {
    pub path: String,
    pub field: &'a LeafField,
    pub args: Option<Vec<Value>>,
    pub dependencies: Vec<String>,
}

pub fn option_bindings<'a>(fields: &'a [FieldNode], data: &Value) -> Vec<OptionBinding<'a>> {
    let mut bindings = Vec::new();
    visit(
        fields,
        &NodeContext::root(),
        data,
        Visibility::VisibleOnly,
        &mut |visit| {
            let FieldNode::Leaf(field) = visit.node else {
                return;
            };
            let Some(source) = &field.options_source else {
                return;
            };
            let scope = visit.context.scope(data);
            let dependencies: Vec<String> = source
                .depends_on
                .as_ref()
                .map(|deps| deps.paths().into_iter().map(str::to_string).collect())
                .unwrap_or_default();
            let mut args = Vec::with_capacity(dependencies.len() + source.params.len());
            let mut satisfied = true;
            for dependency in &dependencies {
                let value = scope.lookup(dependency);
                if is_missing(value) {
                    satisfied = false;
                    break;
                }
                args.extend(value.cloned());
            }
            for param in &source.params {
                args.push(scope.lookup(param).cloned().unwrap_or(Value::Null));
            }
            bindings.push(OptionBinding {
                path: visit.path.to_string(),
                field,
                args: satisfied.then_some(args),
                dependencies,
            });
        },
    );
    bindings
}

/// Every dynamic flow present in the data, with its canonical path.
pub fn flow_fields<'a>(
    fields: &'a [FieldNode],
    data: &Value,
) -> Vec<(String, &'a DynamicFlowField, NodeContext)> {
    let mut flows = Vec::new();
    visit(
        fields,
        &NodeContext::root(),
        data,
        Visibility::All,
        &mut |visit| {
            if let FieldNode::DynamicFlow(flow) = visit.node {
                flows.push((visit.path.to_string(), flow, visit.context));
            }
        },
    );
    flows
}

/// Canonical paths of every leaf reachable in the data, hidden ones included.
pub fn leaf_paths(fields: &[FieldNode], data: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    visit(
        fields,
        &NodeContext::root(),
        data,
        Visibility::All,
        &mut |visit| {
            if matches!(visit.node, FieldNode::Leaf(_)) {
                paths.push(visit.path.to_string());
            }
        },
    );
    paths
}
