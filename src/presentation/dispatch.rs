use log::warn;
use serde_json::Value;

use crate::{
    app::FormEngine,
    domain::{
        DynamicFlowField, FieldNode, FieldOption, FlowStep, LeafField, LeafKind, RepeatableField,
        SectionField,
    },
    form::{
        PasswordStrength,
        condition::should_show,
        password_strength,
        tree::{NodeContext, item_count},
    },
};

const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;

/// Position of a node in the render walk.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub parent: NodeContext,
    pub depth: usize,
}

impl RenderContext {
    pub fn root() -> Self {
        Self::default()
    }

    /// Item index when rendering inside a repeatable.
    pub fn index(&self) -> Option<usize> {
        self.parent.index()
    }

    fn nested(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            depth: self.depth + 1,
        }
    }
}

pub struct LeafView<'a> {
    pub field: &'a LeafField,
    pub path: String,
    pub value: Option<&'a Value>,
    pub error: Option<&'a str>,
    pub options: &'a [FieldOption],
    pub loading: bool,
    pub dropdown_open: bool,
    pub password_visible: bool,
    pub strength: Option<PasswordStrength>,
    pub context: &'a RenderContext,
}

pub struct RepeatableView<'a> {
    pub field: &'a RepeatableField,
    pub path: String,
    pub count: usize,
    pub can_add: bool,
    pub can_remove: bool,
    pub error: Option<&'a str>,
    pub context: &'a RenderContext,
}

pub struct FlowStepView<'a> {
    pub step: &'a FlowStep,
    pub value: &'a str,
    pub options: &'a [FieldOption],
    pub loading: bool,
    pub enabled: bool,
    pub error: Option<&'a str>,
}

pub struct FlowView<'a> {
    pub field: &'a DynamicFlowField,
    pub path: String,
    pub steps: Vec<FlowStepView<'a>>,
    pub complete: bool,
    pub error: Option<&'a str>,
    pub context: &'a RenderContext,
}

/// Presentation functions, one per node shape. The walk decides visibility
/// and threads paths; implementations only turn views into output.
pub trait FieldRenderer {
    type Output;

    fn leaf(&mut self, view: LeafView<'_>) -> Self::Output;

    fn unsupported(&mut self, field: &LeafField, context: &RenderContext) -> Self::Output;

    fn section(
        &mut self,
        section: &SectionField,
        context: &RenderContext,
        children: Vec<Self::Output>,
    ) -> Self::Output;

    fn repeatable(&mut self, view: RepeatableView<'_>, items: Vec<Vec<Self::Output>>)
    -> Self::Output;

    fn flow(&mut self, view: FlowView<'_>) -> Self::Output;
}

/// Render the nodes of the current step (all nodes outside wizards).
pub fn render_form<R: FieldRenderer>(engine: &FormEngine, renderer: &mut R) -> Vec<R::Output> {
    let context = RenderContext::root();
    let mut rendered = Vec::new();
    for node in engine.current_step_nodes() {
        rendered.extend(render_node(engine, node, &context, renderer));
    }
    rendered
}

/// Route one node to its presentation function; hidden nodes yield nothing.
pub fn render_node<R: FieldRenderer>(
    engine: &FormEngine,
    node: &FieldNode,
    context: &RenderContext,
    renderer: &mut R,
) -> Option<R::Output> {
    if !should_show(node.show_when(), &context.parent.scope(engine.values())) {
        return None;
    }
    let output = match node {
        FieldNode::Leaf(field) => render_leaf(engine, field, context, renderer),
        FieldNode::Section(section) => {
            let nested = context.nested();
            let mut children = Vec::new();
            for child in &section.fields {
                children.extend(render_node(engine, child, &nested, renderer));
            }
            renderer.section(section, context, children)
        }
        FieldNode::Repeatable(repeatable) => render_repeatable(engine, repeatable, context, renderer),
        FieldNode::DynamicFlow(flow) => render_flow(engine, flow, context, renderer),
    };
    Some(output)
}

fn render_leaf<R: FieldRenderer>(
    engine: &FormEngine,
    field: &LeafField,
    context: &RenderContext,
    renderer: &mut R,
) -> R::Output {
    if let LeafKind::Unsupported(kind) = &field.kind {
        warn!("field '{}' has unsupported type '{kind}'", field.name);
        return renderer.unsupported(field, context);
    }
    let path = context.parent.path_for(&field.name).to_string();
    let value = engine.value(&path);
    let strength = (field.kind == LeafKind::Password && field.show_password_strength).then(|| {
        let min_length = field
            .validation
            .as_ref()
            .and_then(|rules| rules.min_length.as_ref())
            .and_then(|rule| rule.threshold_usize())
            .unwrap_or(DEFAULT_PASSWORD_MIN_LENGTH);
        password_strength(value.and_then(Value::as_str).unwrap_or(""), min_length)
    });
    let view = LeafView {
        field,
        value,
        error: engine.error(&path),
        options: engine.field_options(&path),
        loading: engine.is_loading(&path),
        dropdown_open: engine.open_dropdown() == Some(path.as_str()),
        password_visible: engine.is_password_visible(&path),
        strength,
        context,
        path,
    };
    renderer.leaf(view)
}

fn render_repeatable<R: FieldRenderer>(
    engine: &FormEngine,
    repeatable: &RepeatableField,
    context: &RenderContext,
    renderer: &mut R,
) -> R::Output {
    let path = context.parent.path_for(&repeatable.name);
    let count = item_count(&path, engine.values());
    let mut items = Vec::with_capacity(count);
    for index in 0..count {
        let item_context = RenderContext {
            parent: context.parent.enter_item(&path, index),
            depth: context.depth + 1,
        };
        let mut item = Vec::new();
        for child in &repeatable.fields {
            item.extend(render_node(engine, child, &item_context, renderer));
        }
        items.push(item);
    }
    let key = path.to_string();
    let view = RepeatableView {
        field: repeatable,
        count,
        can_add: repeatable.max_item_count().is_none_or(|max| count < max),
        can_remove: count > repeatable.min_items().unwrap_or(0),
        error: engine.error(&key),
        context,
        path: key,
    };
    renderer.repeatable(view, items)
}

fn render_flow<R: FieldRenderer>(
    engine: &FormEngine,
    flow: &DynamicFlowField,
    context: &RenderContext,
    renderer: &mut R,
) -> R::Output {
    let path = context.parent.path_for(&flow.name).to_string();
    let state = engine.flow_state(&path);
    let steps = flow
        .flow
        .iter()
        .map(|step| {
            let step_state = state.and_then(|state| state.step(&step.id));
            FlowStepView {
                step,
                value: step_state.map(|s| s.value.as_str()).unwrap_or(""),
                options: step_state.map(|s| s.options()).unwrap_or(&[]),
                loading: step_state.is_some_and(|s| s.is_loading()),
                enabled: engine.is_flow_step_enabled(&path, &step.id),
                error: engine.error(&format!("{path}.{}", step.id)),
            }
        })
        .collect();
    let view = FlowView {
        field: flow,
        steps,
        complete: engine.is_flow_complete(&path),
        error: engine.error(&path),
        context,
        path,
    };
    renderer.flow(view)
}
