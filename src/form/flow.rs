use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::domain::{DynamicFlowField, FlowStep};

use super::{
    condition::ValueScope,
    convert::is_missing,
    options::{FetchTarget, FetchTicket, OptionsSlot},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowStepState {
    pub value: String,
    pub slot: OptionsSlot,
}

impl FlowStepState {
    pub fn options(&self) -> &[crate::domain::FieldOption] {
        &self.slot.options
    }

    pub fn is_loading(&self) -> bool {
        self.slot.loading
    }

    fn clear(&mut self) {
        self.value.clear();
        self.slot.reset();
    }
}

/// Per-step state of one dynamic flow field, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowState {
    steps: IndexMap<String, FlowStepState>,
}

impl FlowState {
    pub fn step(&self, id: &str) -> Option<&FlowStepState> {
        self.steps.get(id)
    }

    pub fn step_mut(&mut self, id: &str) -> Option<&mut FlowStepState> {
        self.steps.get_mut(id)
    }

    pub fn steps(&self) -> impl Iterator<Item = (&str, &FlowStepState)> {
        self.steps.iter().map(|(id, state)| (id.as_str(), state))
    }

    pub fn value(&self, id: &str) -> &str {
        self.steps.get(id).map(|state| state.value.as_str()).unwrap_or("")
    }
}

/// Result of a step selection.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowSelectOutcome {
    Applied(FlowChange),
    /// The previous step has no value yet.
    Locked,
    UnknownStep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowChange {
    pub tickets: Vec<FetchTicket>,
    /// `Some(value)` when the output step changed, `None` when the visible
    /// flow value must be cleared.
    pub output: Option<String>,
    /// Ids of the steps that were reset.
    pub reset: Vec<String>,
}

/// Transition functions for dynamic flows. Holds no state of its own.
pub struct FlowMachine<'a> {
    field: &'a DynamicFlowField,
    path: &'a str,
}

impl<'a> FlowMachine<'a> {
    pub fn new(field: &'a DynamicFlowField, path: &'a str) -> Self {
        Self { field, path }
    }

    fn target(&self, step: &FlowStep) -> FetchTarget {
        FetchTarget::FlowStep {
            field: self.path.to_string(),
            step: step.id.clone(),
        }
    }

    /// Fresh state; the first step is fetched when it depends on nothing.
    pub fn initialize(&self, scope: &ValueScope<'_>) -> (FlowState, Vec<FetchTicket>) {
        let mut state = FlowState {
            steps: self
                .field
                .flow
                .iter()
                .map(|step| (step.id.clone(), FlowStepState::default()))
                .collect(),
        };
        let mut tickets = Vec::new();
        if let Some(first) = self.field.flow.first()
            && first.options_source.depends_on.is_none()
            && let Some(slot) = state.steps.get_mut(&first.id)
        {
            let args = params(first, scope);
            tickets.extend(
                slot.slot
                    .request(self.target(first), &first.options_source, Some(args), true)
                    .into_ticket(),
            );
        }
        (state, tickets)
    }

    pub fn is_step_enabled(&self, state: &FlowState, index: usize) -> bool {
        if index == 0 {
            return true;
        }
        self.field
            .flow
            .get(index - 1)
            .is_some_and(|previous| !state.value(&previous.id).is_empty())
    }

    pub fn is_complete(&self, state: &FlowState) -> bool {
        !state.value(&self.field.output_step_id).is_empty()
    }

    pub fn select(
        &self,
        state: &mut FlowState,
        step_id: &str,
        value: String,
        scope: &ValueScope<'_>,
    ) -> FlowSelectOutcome {
        let Some(index) = self.field.step_index(step_id) else {
            return FlowSelectOutcome::UnknownStep;
        };
        if !self.is_step_enabled(state, index) {
            debug!("flow {} step '{step_id}' is locked", self.path);
            return FlowSelectOutcome::Locked;
        }

        if let Some(current) = state.steps.get_mut(step_id) {
            current.value = value.clone();
        }

        let mut reset = Vec::new();
        for later in &self.field.flow[index + 1..] {
            if let Some(step_state) = state.steps.get_mut(&later.id) {
                step_state.clear();
            }
            reset.push(later.id.clone());
        }

        let mut tickets = Vec::new();
        if !value.is_empty() {
            for later in &self.field.flow[index + 1..] {
                let depends = later
                    .options_source
                    .depends_on
                    .as_ref()
                    .is_some_and(|deps| deps.is_single(step_id));
                if !depends {
                    continue;
                }
                let mut args = vec![Value::String(value.clone())];
                args.extend(params(later, scope));
                if let Some(step_state) = state.steps.get_mut(&later.id) {
                    tickets.extend(
                        step_state
                            .slot
                            .request(self.target(later), &later.options_source, Some(args), true)
                            .into_ticket(),
                    );
                }
            }
        }

        let output = (step_id == self.field.output_step_id).then(|| value.clone());
        debug!(
            "flow {} step '{step_id}' = '{value}', reset {} later step(s)",
            self.path,
            reset.len()
        );
        FlowSelectOutcome::Applied(FlowChange {
            tickets,
            output,
            reset,
        })
    }
}

/// Steps whose `required` rule is unmet, with their messages. A flow with no
/// state yet has every step empty.
pub fn missing_required(
    field: &DynamicFlowField,
    state: Option<&FlowState>,
) -> Vec<(String, String)> {
    field
        .flow
        .iter()
        .filter_map(|step| {
            let value = state.map(|state| state.value(&step.id)).unwrap_or("");
            step_required_error(step, value).map(|message| (step.id.clone(), message))
        })
        .collect()
}

/// Required check for one step value; the default names the step.
pub fn step_required_error(step: &FlowStep, value: &str) -> Option<String> {
    let rule = step.validation.as_ref()?.required.as_ref()?;
    if !rule.is_enabled() || !value.is_empty() {
        return None;
    }
    if rule.message.is_empty() {
        Some(format!("{} is required", step.label))
    } else {
        Some(rule.message.clone())
    }
}

fn params(step: &FlowStep, scope: &ValueScope<'_>) -> Vec<Value> {
    step.options_source
        .params
        .iter()
        .map(|param| {
            let value = scope.lookup(param);
            if is_missing(value) {
                Value::Null
            } else {
                value.cloned().unwrap_or(Value::Null)
            }
        })
        .collect()
}
