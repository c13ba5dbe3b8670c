use serde_json::Value;
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

use crate::{
    app::FormEngine,
    domain::{FieldOption, LeafField, LeafKind, SectionField},
    form::convert::value_to_string,
};

use super::dispatch::{
    FieldRenderer, FlowView, LeafView, RenderContext, RepeatableView, render_form,
};

const INDENT: &str = "  ";
const MIN_WIDTH: usize = 20;

/// Plain-text rendering of the current step, one line per fact.
#[derive(Debug, Clone)]
pub struct OutlineRenderer {
    width: usize,
}

impl Default for OutlineRenderer {
    fn default() -> Self {
        Self { width: 80 }
    }
}

impl OutlineRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
        }
    }

    pub fn render(&mut self, engine: &FormEngine) -> String {
        let config = engine.config();
        let mut lines = Vec::new();
        if !config.title.is_empty() {
            lines.push(config.title.clone());
            lines.push("=".repeat(UnicodeWidthStr::width(config.title.as_str())));
        }
        if let Some(description) = &config.description {
            lines.extend(self.wrapped("", description));
        }
        if let Some(step) = engine.current_step_config() {
            lines.push(format!(
                "Step {} of {}: {}",
                engine.current_step() + 1,
                engine.total_steps(),
                step.title
            ));
        }
        for block in render_form(engine, self) {
            lines.extend(block);
        }
        let label = config.submit_button_label.as_deref().unwrap_or("Submit");
        let action = if engine.is_last_step() { label } else { "Next" };
        lines.push(format!("[{action}]"));
        lines.push(engine.status().message().to_string());
        lines.join("\n")
    }

    fn wrapped(&self, indent: &str, text: &str) -> Vec<String> {
        let width = self.width.saturating_sub(indent.len()).max(MIN_WIDTH / 2);
        wrap(text, width)
            .into_iter()
            .map(|line| format!("{indent}{line}"))
            .collect()
    }
}

fn indent(context: &RenderContext) -> String {
    INDENT.repeat(context.depth)
}

fn option_label<'a>(options: &'a [FieldOption], value: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|option| option.value == value)
        .map(|option| option.label.as_str())
}

fn display_value(view: &LeafView<'_>) -> String {
    let Some(value) = view.value else {
        return "-".to_string();
    };
    match (&view.field.kind, value) {
        (LeafKind::Password, Value::String(text)) if !view.password_visible => {
            "*".repeat(text.chars().count())
        }
        (LeafKind::Switch, Value::Bool(flag)) => String::from(if *flag { "on" } else { "off" }),
        (_, Value::String(text)) if view.field.kind.is_choice() => option_label(view.options, text)
            .unwrap_or(text.as_str())
            .to_string(),
        (_, Value::Array(items)) if view.field.kind.is_choice() => items
            .iter()
            .map(|item| {
                let raw = value_to_string(item);
                option_label(view.options, &raw)
                    .map(str::to_string)
                    .unwrap_or(raw)
            })
            .collect::<Vec<_>>()
            .join(", "),
        (_, value) => {
            let text = value_to_string(value);
            if text.is_empty() { "-".to_string() } else { text }
        }
    }
}

impl FieldRenderer for OutlineRenderer {
    type Output = Vec<String>;

    fn leaf(&mut self, view: LeafView<'_>) -> Vec<String> {
        let pad = indent(view.context);
        let required = view
            .field
            .validation
            .as_ref()
            .is_some_and(|rules| rules.is_required());
        let marker = if required { " *" } else { "" };
        let mut lines = vec![format!(
            "{pad}{}{marker}: {}",
            view.field.display_label(),
            display_value(&view)
        )];
        let detail = format!("{pad}{INDENT}");
        if view.loading {
            lines.push(format!("{detail}(loading options)"));
        } else if view.field.kind.is_choice() && (view.dropdown_open || view.value.is_none()) {
            let choices = view
                .options
                .iter()
                .map(|option| option.label.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            if choices.is_empty() {
                lines.push(format!("{detail}(no options)"));
            } else {
                lines.extend(self.wrapped(&detail, &format!("options: {choices}")));
            }
        }
        if let Some(strength) = view.strength {
            lines.push(format!("{detail}strength: {} ({}/5)", strength.label, strength.score));
        }
        if view.field.character_counter
            && let Some(Value::String(text)) = view.value
        {
            let max = view
                .field
                .validation
                .as_ref()
                .and_then(|rules| rules.max_length.as_ref())
                .and_then(|rule| rule.threshold_usize());
            let count = text.chars().count();
            lines.push(match max {
                Some(max) => format!("{detail}{count}/{max} characters"),
                None => format!("{detail}{count} characters"),
            });
        }
        if let Some(help) = &view.field.help_text {
            lines.extend(self.wrapped(&detail, help));
        }
        if let Some(error) = view.error {
            lines.push(format!("{detail}! {error}"));
        }
        lines
    }

    fn unsupported(&mut self, field: &LeafField, context: &RenderContext) -> Vec<String> {
        vec![format!(
            "{}{}: [unsupported field type '{}']",
            indent(context),
            field.display_label(),
            field.kind.as_str()
        )]
    }

    fn section(
        &mut self,
        section: &SectionField,
        context: &RenderContext,
        children: Vec<Vec<String>>,
    ) -> Vec<String> {
        let pad = indent(context);
        let title = section.display_title();
        let mut lines = Vec::new();
        if !title.is_empty() {
            lines.push(format!("{pad}{title}"));
            lines.push(format!("{pad}{}", "-".repeat(UnicodeWidthStr::width(title))));
        }
        if let Some(description) = &section.description {
            lines.extend(self.wrapped(&pad, description));
        }
        lines.extend(children.into_iter().flatten());
        lines
    }

    fn repeatable(
        &mut self,
        view: RepeatableView<'_>,
        items: Vec<Vec<Vec<String>>>,
    ) -> Vec<String> {
        let pad = indent(view.context);
        let mut lines = vec![format!(
            "{pad}{} ({} item(s))",
            view.field.display_title(),
            view.count
        )];
        for (index, item) in items.into_iter().enumerate() {
            let remove = if view.can_remove {
                format!(
                    " [{}]",
                    view.field.remove_button_label.as_deref().unwrap_or("Remove")
                )
            } else {
                String::new()
            };
            lines.push(format!("{pad}{INDENT}#{}{remove}", index + 1));
            lines.extend(item.into_iter().flatten());
        }
        if view.can_add {
            lines.push(format!(
                "{pad}{INDENT}[{}]",
                view.field.add_button_label.as_deref().unwrap_or("Add item")
            ));
        }
        if let Some(error) = view.error {
            lines.push(format!("{pad}{INDENT}! {error}"));
        }
        lines
    }

    fn flow(&mut self, view: FlowView<'_>) -> Vec<String> {
        let pad = indent(view.context);
        let label = view.field.label.as_deref().unwrap_or(&view.field.name);
        let state = if view.complete { "complete" } else { "incomplete" };
        let mut lines = vec![format!("{pad}{label} ({state})")];
        for (index, step) in view.steps.iter().enumerate() {
            if !view.field.show_all_steps && !step.enabled {
                continue;
            }
            let value = option_label(step.options, step.value).unwrap_or(if step.value.is_empty() {
                "-"
            } else {
                step.value
            });
            let mut line = format!("{pad}{INDENT}{}. {}: {value}", index + 1, step.step.label);
            if !step.enabled {
                line.push_str(" (locked)");
            } else if step.loading {
                line.push_str(" (loading options)");
            } else if step.value.is_empty() {
                let choices = step
                    .options
                    .iter()
                    .map(|option| option.label.as_str())
                    .collect::<Vec<_>>();
                if choices.is_empty() {
                    line.push_str(" (no options)");
                } else {
                    line.push_str(&format!(" [{}]", choices.join(" | ")));
                }
            }
            lines.push(line);
            if let Some(error) = step.error {
                lines.push(format!("{pad}{INDENT}{INDENT}! {error}"));
            }
        }
        if let Some(error) = view.error {
            lines.push(format!("{pad}{INDENT}! {error}"));
        }
        lines
    }
}
