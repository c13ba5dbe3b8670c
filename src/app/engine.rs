use std::{fmt, future::Future, sync::Arc};

use anyhow::{Result, anyhow};
use futures::future::{BoxFuture, FutureExt, join_all};
use log::{debug, error, warn};
use serde_json::Value;

use crate::{
    domain::{
        FieldNode, FieldOption, FieldPath, FormConfig, FormStep, ValidationBehaviour,
        ValidationTrigger, reindex_key,
    },
    form::{
        ErrorMap, FetchTarget, FetchTicket, FlowMachine, FlowSelectOutcome, FlowState, FormError,
        FormStore, FunctionRegistry, OptionsFuture, RequestOutcome, ValidatorRegistry,
        condition::should_show,
        convert::is_missing,
        defaults::{form_defaults, item_defaults, leaf_cleared, overlay},
        flow::step_required_error,
        tree::{self, Located, TreeValidator},
    },
};

use super::{
    events::{EventHub, FormEvent},
    navigation::{StepNavigator, StepTransition},
    options::{DEFAULT_LOADING_MESSAGE, EngineOptions},
    status::StatusLine,
};

pub type SubmitFuture = BoxFuture<'static, Result<()>>;

/// Injected transport receiving the full value tree.
pub type SubmitHandler = Arc<dyn Fn(Value) -> SubmitFuture + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { message: String },
    Invalid { errors: usize },
    Failed { message: String },
}

pub struct FormEngineBuilder {
    config: Arc<FormConfig>,
    functions: FunctionRegistry,
    validators: ValidatorRegistry,
    submit: Option<SubmitHandler>,
    options: EngineOptions,
    initial_data: Option<Value>,
}

impl FormEngineBuilder {
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = validators;
        self
    }

    pub fn with_submit<F, Fut>(mut self, submit: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.submit = Some(Arc::new(move |values| submit(values).boxed()));
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Values layered over the schema defaults at mount.
    pub fn with_initial_data(mut self, data: Value) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn mount(self) -> FormEngine {
        let FormEngineBuilder {
            config,
            functions,
            validators,
            submit,
            options,
            initial_data,
        } = self;

        let defaults = form_defaults(&config.fields);
        let initial = match &initial_data {
            Some(data) => overlay(defaults, data),
            None => defaults,
        };
        let trigger = options
            .validation_trigger
            .or_else(|| config.validation.as_ref().map(ValidationBehaviour::trigger))
            .unwrap_or_default();
        let total_steps = if config.is_wizard() {
            config.steps.len()
        } else {
            1
        };
        let submit = submit.unwrap_or_else(|| Arc::new(|_| futures::future::ready(Ok(())).boxed()));

        let mut engine = FormEngine {
            config,
            functions,
            validators,
            submit,
            options,
            trigger,
            store: FormStore::new(initial),
            navigator: StepNavigator::new(total_steps),
            status: StatusLine::new(),
            pending: Vec::new(),
            events: EventHub::default(),
        };
        engine.refresh_derived(None);
        debug!(
            "mounted form '{}' with {} pending fetch(es)",
            engine.config.title,
            engine.pending.len()
        );
        engine
    }
}

/// A mounted form: owns the store and routes every interaction through the
/// evaluator, validator, resolver and flow machine.
pub struct FormEngine {
    config: Arc<FormConfig>,
    functions: FunctionRegistry,
    validators: ValidatorRegistry,
    submit: SubmitHandler,
    options: EngineOptions,
    trigger: ValidationTrigger,
    store: FormStore,
    navigator: StepNavigator,
    status: StatusLine,
    pending: Vec<FetchTicket>,
    events: EventHub,
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("title", &self.config.title)
            .field("functions", &self.functions)
            .field("validators", &self.validators)
            .field("trigger", &self.trigger)
            .field("store", &self.store)
            .field("navigator", &self.navigator)
            .field("pending", &self.pending.len())
            .field("listeners", &self.events.len())
            .finish()
    }
}

impl FormEngine {
    pub fn builder(config: impl Into<Arc<FormConfig>>) -> FormEngineBuilder {
        FormEngineBuilder {
            config: config.into(),
            functions: FunctionRegistry::new(),
            validators: ValidatorRegistry::with_builtins(),
            submit: None,
            options: EngineOptions::default(),
            initial_data: None,
        }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn values(&self) -> &Value {
        self.store.values()
    }

    pub fn value(&self, path: &str) -> Option<&Value> {
        FieldPath::parse(path).ok().and_then(|path| self.store.value(&path))
    }

    pub fn errors(&self) -> &ErrorMap {
        self.store.errors()
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.store.error(key)
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn validation_trigger(&self) -> ValidationTrigger {
        self.trigger
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn is_submitting(&self) -> bool {
        self.store.is_submitting()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&FormEvent) + Send + 'static) {
        self.events.subscribe(Box::new(listener));
    }

    /// Write a value by canonical path.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), FormError> {
        let config = Arc::clone(&self.config);
        let (parsed, located) = locate_path(&config, path)?;
        // Items only come into existence through `add_item`.
        if let Some((repeatable, index)) = tree::missing_item(&parsed, self.store.values()) {
            return Err(FormError::IndexOutOfRange {
                path: repeatable.to_string(),
                index,
            });
        }
        let key = parsed.to_string();
        self.store.set_value(&parsed, value);
        if self.trigger == ValidationTrigger::Change {
            self.validate_located(&located, &key);
        }
        self.refresh_derived(Some(&key));
        self.emit_change();
        Ok(())
    }

    /// Field lost focus: validate it unless errors only show on submit.
    pub fn blur(&mut self, path: &str) -> Result<Option<String>, FormError> {
        if self.trigger == ValidationTrigger::Submit {
            let parsed = FieldPath::parse(path)?;
            return Ok(self.store.error(&parsed.to_string()).map(str::to_string));
        }
        self.validate_field(path)
    }

    /// Validate one node now and record or clear its error.
    pub fn validate_field(&mut self, path: &str) -> Result<Option<String>, FormError> {
        let config = Arc::clone(&self.config);
        let (parsed, located) = locate_path(&config, path)?;
        let key = parsed.to_string();
        self.validate_located(&located, &key);
        Ok(self.store.error(&key).map(str::to_string))
    }

    fn validate_located(&mut self, located: &Located<'_>, key: &str) {
        let errors = TreeValidator::new(self.store.values(), &self.validators, self.store.flows())
            .validate_located(located);
        let mut owned = vec![key.to_string()];
        if let FieldNode::DynamicFlow(flow) = located.node {
            owned.extend(flow.flow.iter().map(|step| format!("{key}.{}", step.id)));
        }
        for owned_key in owned {
            match errors.get(&owned_key) {
                Some(message) => self.store.set_error(owned_key, message.clone()),
                None => self.store.clear_error(&owned_key),
            }
        }
    }

    /// Full-tree validation; the result replaces the whole error map.
    pub fn validate_all(&mut self) -> &ErrorMap {
        let errors = TreeValidator::new(self.store.values(), &self.validators, self.store.flows())
            .validate_all(&self.config.fields);
        self.store.replace_errors(errors);
        self.store.errors()
    }

    pub fn is_visible(&self, path: &str) -> bool {
        let Ok((_, located)) = locate_path(&self.config, path) else {
            return false;
        };
        should_show(
            located.node.show_when(),
            &located.context.scope(self.store.values()),
        )
    }

    // -- repeatables --

    /// Append a fresh item; returns its index.
    pub fn add_item(&mut self, path: &str) -> Result<usize, FormError> {
        let config = Arc::clone(&self.config);
        let (parsed, located) = locate_path(&config, path)?;
        let key = parsed.to_string();
        let FieldNode::Repeatable(repeatable) = located.node else {
            return Err(FormError::NotRepeatable(key));
        };
        let count = tree::item_count(&parsed, self.store.values());
        if let Some(max) = repeatable.max_item_count()
            && count >= max
        {
            self.store
                .set_error(key.clone(), tree::max_items_message(repeatable, max));
            return Err(FormError::ItemLimit { path: key, max });
        }
        let mut items = match self.store.value(&parsed) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        items.push(item_defaults(repeatable));
        self.store.set_value(&parsed, Value::Array(items));
        self.refresh_derived(Some(&key));
        self.emit_change();
        Ok(count)
    }

    pub fn remove_item(&mut self, path: &str, index: usize) -> Result<(), FormError> {
        let config = Arc::clone(&self.config);
        let (parsed, located) = locate_path(&config, path)?;
        let key = parsed.to_string();
        let FieldNode::Repeatable(repeatable) = located.node else {
            return Err(FormError::NotRepeatable(key));
        };
        let count = tree::item_count(&parsed, self.store.values());
        if index >= count {
            return Err(FormError::IndexOutOfRange { path: key, index });
        }
        if let Some(min) = repeatable.min_items()
            && count <= min
        {
            self.store
                .set_error(key.clone(), tree::min_items_message(repeatable, min));
            return Err(FormError::ItemMinimum { path: key, min });
        }
        self.store.remove_value(&parsed.item(index));
        self.store.reindex_item_removal(&key, index);
        self.pending.retain_mut(|ticket| retarget(ticket, &key, index));
        self.store.clear_error(&key);
        self.refresh_derived(Some(&key));
        self.emit_change();
        Ok(())
    }

    // -- dynamic flows --

    pub fn flow_state(&self, path: &str) -> Option<&FlowState> {
        let parsed = FieldPath::parse(path).ok()?;
        self.store.flow(&parsed.to_string())
    }

    pub fn is_flow_step_enabled(&self, path: &str, step_id: &str) -> bool {
        let Ok((parsed, located)) = locate_path(&self.config, path) else {
            return false;
        };
        let FieldNode::DynamicFlow(field) = located.node else {
            return false;
        };
        let key = parsed.to_string();
        match (self.store.flow(&key), field.step_index(step_id)) {
            (Some(state), Some(index)) => FlowMachine::new(field, &key).is_step_enabled(state, index),
            _ => false,
        }
    }

    pub fn is_flow_complete(&self, path: &str) -> bool {
        let Ok((parsed, located)) = locate_path(&self.config, path) else {
            return false;
        };
        let FieldNode::DynamicFlow(field) = located.node else {
            return false;
        };
        let key = parsed.to_string();
        self.store
            .flow(&key)
            .is_some_and(|state| FlowMachine::new(field, &key).is_complete(state))
    }

    pub fn select_flow_step(
        &mut self,
        path: &str,
        step_id: &str,
        value: impl Into<String>,
    ) -> Result<FlowSelectOutcome, FormError> {
        let config = Arc::clone(&self.config);
        let (parsed, located) = locate_path(&config, path)?;
        let key = parsed.to_string();
        let FieldNode::DynamicFlow(field) = located.node else {
            return Err(FormError::UnknownField(key));
        };
        let value = value.into();
        let snapshot = self.store.values().clone();
        let scope = located.context.scope(&snapshot);
        let machine = FlowMachine::new(field, &key);

        if self.store.flow(&key).is_none() {
            let (state, tickets) = machine.initialize(&scope);
            self.store.insert_flow(key.clone(), state);
            self.pending.extend(tickets);
        }
        let Some(state) = self.store.flow_mut(&key) else {
            return Err(FormError::UnknownField(key.clone()));
        };
        let outcome = machine.select(state, step_id, value.clone(), &scope);

        if let FlowSelectOutcome::Applied(change) = &outcome {
            self.pending.extend(change.tickets.iter().cloned());
            match &change.output {
                Some(output) => self.store.set_value(&parsed, Value::String(output.clone())),
                None => {
                    self.store.remove_value(&parsed);
                }
            }
            let step_key = format!("{key}.{step_id}");
            let step_error = field
                .flow
                .iter()
                .find(|step| step.id == step_id)
                .and_then(|step| step_required_error(step, &value));
            match step_error {
                Some(message) => self.store.set_error(step_key, message),
                None => self.store.clear_error(&step_key),
            }
            for reset in &change.reset {
                self.store.clear_error(&format!("{key}.{reset}"));
            }
            self.refresh_derived(Some(&key));
            self.emit_change();
        }
        Ok(outcome)
    }

    // -- options --

    /// Options currently offered by a choice leaf: loaded options when it has a
    /// source, otherwise its static list.
    pub fn field_options(&self, path: &str) -> &[FieldOption] {
        let Ok((parsed, located)) = locate_path(&self.config, path) else {
            return &[];
        };
        let FieldNode::Leaf(field) = located.node else {
            return &[];
        };
        if field.options_source.is_none() {
            return &field.options;
        }
        self.store
            .options_slot(&parsed.to_string())
            .map(|slot| slot.options.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_loading(&self, path: &str) -> bool {
        FieldPath::parse(path)
            .ok()
            .and_then(|parsed| self.store.options_slot(&parsed.to_string()))
            .is_some_and(|slot| slot.loading)
    }

    /// Force a new fetch for a choice leaf even if its arguments are unchanged.
    pub fn refresh_options(&mut self, path: &str) -> Result<(), FormError> {
        let config = Arc::clone(&self.config);
        let (parsed, _) = locate_path(&config, path)?;
        let key = parsed.to_string();
        let bindings = tree::option_bindings(&config.fields, self.store.values());
        if let Some(binding) = bindings.iter().find(|binding| binding.path == key)
            && let Some(source) = &binding.field.options_source
        {
            let outcome = self.store.options_slot_entry(&key).request(
                FetchTarget::Field(key.clone()),
                source,
                binding.args.clone(),
                true,
            );
            self.pending.extend(outcome.into_ticket());
        }
        Ok(())
    }

    pub fn has_pending_fetches(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hand queued fetches to the caller, who must feed every result back
    /// through [`FormEngine::complete_fetch`].
    pub fn take_pending_fetches(&mut self) -> Vec<FetchTicket> {
        std::mem::take(&mut self.pending)
    }

    /// The future performing one ticket, with latency and timeout applied.
    pub fn fetch(&self, ticket: &FetchTicket) -> OptionsFuture {
        let call = self.functions.invoke(&ticket.function, ticket.args.clone());
        let latency = self.options.simulated_latency;
        let timeout = self.options.fetch_timeout;
        let target = ticket.target.clone();
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!("options fetch for {target} timed out after {limit:?}")),
                },
                None => call.await,
            }
        }
        .boxed()
    }

    /// Apply a fetch result; returns false when it was stale or its target is gone.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, result: Result<Vec<FieldOption>>) -> bool {
        let applied = match &ticket.target {
            FetchTarget::Field(path) => self
                .store
                .options_slot_mut(path)
                .is_some_and(|slot| slot.complete(ticket, result)),
            FetchTarget::FlowStep { field, step } => self
                .store
                .flow_mut(field)
                .and_then(|state| state.step_mut(step))
                .is_some_and(|state| state.slot.complete(ticket, result)),
        };
        if applied {
            self.events.emit(FormEvent::OptionsLoaded(ticket.target.clone()));
        } else {
            debug!("fetch result for {} was not applied", ticket.target);
        }
        applied
    }

    /// Run queued fetches concurrently until none remain.
    pub async fn settle(&mut self) {
        loop {
            let tickets = self.take_pending_fetches();
            if tickets.is_empty() {
                break;
            }
            let results = join_all(tickets.iter().map(|ticket| self.fetch(ticket))).await;
            for (ticket, result) in tickets.iter().zip(results) {
                self.complete_fetch(ticket, result);
            }
        }
    }

    // -- wizard --

    pub fn current_step(&self) -> usize {
        self.navigator.current()
    }

    pub fn total_steps(&self) -> usize {
        self.navigator.total()
    }

    pub fn is_first_step(&self) -> bool {
        self.navigator.is_first()
    }

    pub fn is_last_step(&self) -> bool {
        self.navigator.is_last()
    }

    pub fn current_step_config(&self) -> Option<&FormStep> {
        if !self.config.is_wizard() {
            return None;
        }
        self.config.steps.get(self.navigator.current())
    }

    /// Top-level nodes shown at the current step (every node outside wizards).
    pub fn current_step_nodes(&self) -> Vec<&FieldNode> {
        match self.current_step_config() {
            Some(step) => tree::resolve_step_fields(&self.config.fields, &step.fields),
            None => self.config.fields.iter().collect(),
        }
    }

    /// Validate the current step and advance when it is clean.
    pub fn next_step(&mut self) -> StepTransition {
        if self.navigator.is_last() {
            return StepTransition::AtBoundary;
        }
        let errors = self.validate_current_step();
        if errors > 0 {
            debug!("step {} blocked by {errors} error(s)", self.navigator.current());
            return StepTransition::Blocked { errors };
        }
        let transition = self.navigator.advance();
        self.after_step_change(transition);
        transition
    }

    pub fn previous_step(&mut self) -> StepTransition {
        let transition = self.navigator.retreat();
        self.after_step_change(transition);
        transition
    }

    fn after_step_change(&mut self, transition: StepTransition) {
        if let StepTransition::Moved { to, .. } = transition {
            self.store.close_dropdowns();
            self.events.emit(FormEvent::StepChanged(to));
        }
    }

    /// Validate the current step's fields, replacing only their errors.
    pub fn validate_current_step(&mut self) -> usize {
        let config = Arc::clone(&self.config);
        let nodes = match config.steps.get(self.navigator.current()) {
            Some(step) if config.is_wizard() => tree::resolve_step_fields(&config.fields, &step.fields),
            _ => config.fields.iter().collect(),
        };
        let errors = TreeValidator::new(self.store.values(), &self.validators, self.store.flows())
            .validate_nodes(&nodes);
        let count = errors.len();
        self.store.merge_errors_under(&tree::owned_prefixes(&nodes), errors);
        count
    }

    // -- affordances --

    pub fn toggle_dropdown(&mut self, key: &str) {
        self.store.toggle_dropdown(key);
    }

    pub fn close_dropdowns(&mut self) {
        self.store.close_dropdowns();
    }

    pub fn open_dropdown(&self) -> Option<&str> {
        self.store.open_dropdown()
    }

    pub fn toggle_password_visibility(&mut self, path: &str) {
        self.store.toggle_password_visibility(path);
    }

    pub fn is_password_visible(&self, path: &str) -> bool {
        self.store.is_password_visible(path)
    }

    // -- submission --

    pub async fn submit(&mut self) -> SubmitOutcome {
        let errors = self.validate_all().len();
        if errors > 0 {
            self.status.issues_remaining(errors);
            return SubmitOutcome::Invalid { errors };
        }

        let messages = self.config.on_submit.clone().unwrap_or_default();
        self.store.set_submitting(true);
        self.status.submitting(
            messages
                .loading_message
                .as_deref()
                .unwrap_or(DEFAULT_LOADING_MESSAGE),
        );
        let payload = self.store.values().clone();
        let result = (self.submit)(payload).await;
        self.store.set_submitting(false);

        match result {
            Ok(()) => {
                let message = messages
                    .success_message
                    .unwrap_or_else(|| self.options.default_success_message.clone());
                self.reset();
                self.status.submitted(&message);
                self.events.emit(FormEvent::Submitted);
                SubmitOutcome::Submitted { message }
            }
            Err(err) => {
                error!("form submission failed: {err:#}");
                let message = messages
                    .error_message
                    .unwrap_or_else(|| self.options.default_error_message.clone());
                self.status.failed(&message);
                self.events.emit(FormEvent::SubmitFailed(message.clone()));
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Back to mount-time values, first step, no errors.
    pub fn reset(&mut self) {
        self.store.reset();
        self.navigator.reset();
        self.pending.clear();
        self.status.ready();
        self.refresh_derived(None);
        self.emit_change();
    }

    // -- derived state --

    fn emit_change(&mut self) {
        let values = self.store.values().clone();
        self.events.emit(FormEvent::ValuesChanged(values));
    }

    fn refresh_derived(&mut self, touched: Option<&str>) {
        self.sync_flows();
        self.sync_options(touched);
    }

    /// Initialize flow state for every flow present in the data.
    fn sync_flows(&mut self) {
        let config = Arc::clone(&self.config);
        for (path, field, context) in tree::flow_fields(&config.fields, self.store.values()) {
            if self.store.flow(&path).is_some() {
                continue;
            }
            let (state, tickets) = {
                let scope = context.scope(self.store.values());
                FlowMachine::new(field, &path).initialize(&scope)
            };
            self.store.insert_flow(path, state);
            self.pending.extend(tickets);
        }
    }

    /// Re-derive every visible option binding. A binding whose dependency
    /// changed clears its own value, which can cascade down a select chain.
    fn sync_options(&mut self, touched: Option<&str>) {
        let config = Arc::clone(&self.config);
        let mut passes = 0;
        loop {
            let bindings = tree::option_bindings(&config.fields, self.store.values());
            let mut cleared = Vec::new();
            for binding in &bindings {
                let Some(source) = &binding.field.options_source else {
                    continue;
                };
                let force = !source.caches()
                    && touched.is_some_and(|key| {
                        binding.dependencies.iter().any(|dep| touches(key, dep))
                    });
                let slot = self.store.options_slot_entry(&binding.path);
                let previous = slot.requested_for.clone();
                let outcome = slot.request(
                    FetchTarget::Field(binding.path.clone()),
                    source,
                    binding.args.clone(),
                    force,
                );
                let dependency_changed = match &outcome {
                    RequestOutcome::Issued(_) => previous.is_some() && previous != binding.args,
                    RequestOutcome::Cleared => true,
                    RequestOutcome::Unchanged => false,
                };
                if let RequestOutcome::Issued(ticket) = outcome {
                    self.pending.push(ticket);
                }
                if dependency_changed
                    && self.options.reset_dependents
                    && !binding.dependencies.is_empty()
                {
                    cleared.push((binding.path.clone(), leaf_cleared(binding.field)));
                }
            }

            let mut changed = false;
            for (path, fallback) in cleared {
                let Ok(parsed) = FieldPath::parse(&path) else {
                    continue;
                };
                let current = self.store.value(&parsed);
                let unchanged = match &fallback {
                    Some(fallback) => current == Some(fallback),
                    None => is_missing(current),
                };
                if unchanged {
                    continue;
                }
                debug!("clearing '{path}' after its option dependency changed");
                match fallback {
                    Some(fallback) => self.store.set_value(&parsed, fallback),
                    None => {
                        self.store.remove_value(&parsed);
                    }
                }
                changed = true;
            }

            if !changed {
                break;
            }
            passes += 1;
            if passes > bindings.len() {
                warn!("option dependencies did not settle after {passes} passes; check dependsOn for cycles");
                break;
            }
        }
    }
}

fn locate_path<'c>(
    config: &'c FormConfig,
    path: &str,
) -> Result<(FieldPath, Located<'c>), FormError> {
    let parsed = FieldPath::parse(path)?;
    let located = tree::locate(&config.fields, &parsed)
        .ok_or_else(|| FormError::UnknownField(path.to_string()))?;
    Ok((parsed, located))
}

/// A dependency path written relative to an item still matches the
/// canonical path that was written.
fn touches(written: &str, dependency: &str) -> bool {
    written == dependency || written.ends_with(&format!(".{dependency}"))
}

/// Follow a queued ticket through an item removal; false drops it.
fn retarget(ticket: &mut FetchTicket, repeatable: &str, removed: usize) -> bool {
    let path = match &mut ticket.target {
        FetchTarget::Field(path) => path,
        FetchTarget::FlowStep { field, .. } => field,
    };
    match reindex_key(path, repeatable, removed) {
        Some(moved) => {
            *path = moved;
            true
        }
        None => false,
    }
}
