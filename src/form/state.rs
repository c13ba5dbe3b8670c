use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::domain::{FieldPath, reindex_after_removal};

use super::{flow::FlowState, options::OptionsSlot};

/// Canonical path (or `flow.stepId`) -> first failing message.
pub type ErrorMap = IndexMap<String, String>;

/// The mutable model of one mounted form.
#[derive(Debug, Clone, Default)]
pub struct FormStore {
    values: Value,
    initial: Value,
    errors: ErrorMap,
    options: IndexMap<String, OptionsSlot>,
    flows: IndexMap<String, FlowState>,
    open_dropdown: Option<String>,
    visible_passwords: IndexMap<String, bool>,
    submitting: bool,
}

impl FormStore {
    pub fn new(initial: Value) -> Self {
        let initial = match initial {
            Value::Object(_) => initial,
            _ => Value::Object(Map::new()),
        };
        Self {
            values: initial.clone(),
            initial,
            ..Self::default()
        }
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    pub fn value(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.values)
    }

    /// Write at the canonical path and clear the error recorded there.
    pub fn set_value(&mut self, path: &FieldPath, value: Value) {
        path.set(&mut self.values, value);
        self.errors.shift_remove(&path.to_string());
    }

    pub fn remove_value(&mut self, path: &FieldPath) -> Option<Value> {
        path.remove(&mut self.values)
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    pub fn set_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(key.into(), message.into());
    }

    pub fn clear_error(&mut self, key: &str) {
        self.errors.shift_remove(key);
    }

    pub fn replace_errors(&mut self, errors: ErrorMap) {
        self.errors = errors;
    }

    /// Replace every error under `prefix` (itself or `prefix.`/`prefix[`)
    /// with `errors`, leaving the rest of the map alone.
    pub fn merge_errors_under(&mut self, prefixes: &[String], errors: ErrorMap) {
        self.errors
            .retain(|key, _| !prefixes.iter().any(|prefix| is_under(key, prefix)));
        self.errors.extend(errors);
    }

    pub fn options_slot(&self, path: &str) -> Option<&OptionsSlot> {
        self.options.get(path)
    }

    pub fn options_slot_mut(&mut self, path: &str) -> Option<&mut OptionsSlot> {
        self.options.get_mut(path)
    }

    pub fn options_slot_entry(&mut self, path: &str) -> &mut OptionsSlot {
        self.options.entry(path.to_string()).or_default()
    }

    pub fn flow(&self, path: &str) -> Option<&FlowState> {
        self.flows.get(path)
    }

    pub fn flow_mut(&mut self, path: &str) -> Option<&mut FlowState> {
        self.flows.get_mut(path)
    }

    pub fn flows(&self) -> &IndexMap<String, FlowState> {
        &self.flows
    }

    pub fn insert_flow(&mut self, path: impl Into<String>, state: FlowState) {
        self.flows.insert(path.into(), state);
    }

    pub fn open_dropdown(&self) -> Option<&str> {
        self.open_dropdown.as_deref()
    }

    /// At most one dropdown is open; toggling another one moves it.
    pub fn toggle_dropdown(&mut self, key: &str) {
        if self.open_dropdown.as_deref() == Some(key) {
            self.open_dropdown = None;
        } else {
            self.open_dropdown = Some(key.to_string());
        }
    }

    pub fn close_dropdowns(&mut self) {
        self.open_dropdown = None;
    }

    pub fn is_password_visible(&self, path: &str) -> bool {
        self.visible_passwords.get(path).copied().unwrap_or(false)
    }

    pub fn toggle_password_visibility(&mut self, path: &str) {
        let entry = self.visible_passwords.entry(path.to_string()).or_insert(false);
        *entry = !*entry;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    /// Shift every keyed side table after `repeatable[removed]` was deleted.
    pub fn reindex_item_removal(&mut self, repeatable: &str, removed: usize) {
        reindex_after_removal(&mut self.errors, repeatable, removed);
        reindex_after_removal(&mut self.options, repeatable, removed);
        reindex_after_removal(&mut self.flows, repeatable, removed);
        reindex_after_removal(&mut self.visible_passwords, repeatable, removed);
        if let Some(open) = &self.open_dropdown
            && is_under(open, repeatable)
            && open != repeatable
        {
            self.open_dropdown = None;
        }
    }

    /// Back to mount-time values with every side table cleared. Option slots
    /// are kept but reset so fetches still in flight are discarded.
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors.clear();
        self.options.values_mut().for_each(OptionsSlot::reset);
        self.flows.clear();
        self.open_dropdown = None;
        self.visible_passwords.clear();
        self.submitting = false;
    }
}

/// `key` equals `prefix` or addresses something nested below it.
pub fn is_under(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}
