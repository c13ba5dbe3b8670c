use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Result;
use futures::future::{self, BoxFuture, FutureExt};
use log::{debug, error, warn};
use serde_json::Value;

use crate::domain::{FieldOption, OptionsSource};

pub type OptionsFuture = BoxFuture<'static, Result<Vec<FieldOption>>>;

/// Injected data source: receives dependency values then `params` values.
pub type OptionsFunction = Arc<dyn Fn(Vec<Value>) -> OptionsFuture + Send + Sync>;

/// Closed name -> function table handed to the engine at construction.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, OptionsFunction>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_async<F, Fut>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<FieldOption>>> + Send + 'static,
    {
        let function: OptionsFunction = Arc::new(move |args| function(args).boxed());
        self.functions.insert(name.into(), function);
        self
    }

    /// Register a function that answers without suspending.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Vec<FieldOption>> + Send + Sync + 'static,
    {
        let function: OptionsFunction =
            Arc::new(move |args| future::ready(function(&args)).boxed());
        self.functions.insert(name.into(), function);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Missing functions resolve to an empty option list.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> OptionsFuture {
        match self.functions.get(name) {
            Some(function) => function(args),
            None => {
                warn!("options function '{name}' is not registered");
                future::ready(Ok(Vec::new())).boxed()
            }
        }
    }
}

/// Who a fetch is for: a choice leaf or one step of a dynamic flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    Field(String),
    FlowStep { field: String, step: String },
}

impl FetchTarget {
    /// Key in the error map / slot table (`field` or `field.step`).
    pub fn key(&self) -> String {
        match self {
            FetchTarget::Field(path) => path.clone(),
            FetchTarget::FlowStep { field, step } => format!("{field}.{step}"),
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A fetch the engine wants performed. The generation is captured at issue
/// time; completions carrying an older generation are discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub target: FetchTarget,
    pub generation: u64,
    pub function: String,
    pub args: Vec<Value>,
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Generations are unique across slots, so a slot rebuilt after a reset or a
/// reindex never matches a ticket issued for its predecessor.
fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Options state of one choice leaf or flow step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsSlot {
    pub options: Vec<FieldOption>,
    pub loading: bool,
    pub generation: u64,
    pub requested_for: Option<Vec<Value>>,
    pub loaded_for: Option<Vec<Value>>,
}

/// What a request did to a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// A new fetch was issued.
    Issued(FetchTicket),
    /// Arguments unchanged: cached or already in flight.
    Unchanged,
    /// A dependency is absent; the slot was emptied without a call.
    Cleared,
}

impl RequestOutcome {
    pub fn into_ticket(self) -> Option<FetchTicket> {
        match self {
            RequestOutcome::Issued(ticket) => Some(ticket),
            _ => None,
        }
    }
}

impl OptionsSlot {
    /// Ask for options for `args`; `None` means a dependency is absent.
    pub fn request(
        &mut self,
        target: FetchTarget,
        source: &OptionsSource,
        args: Option<Vec<Value>>,
        force: bool,
    ) -> RequestOutcome {
        let Some(args) = args else {
            let had_state =
                self.loading || self.requested_for.is_some() || !self.options.is_empty();
            self.generation = next_generation();
            self.options.clear();
            self.loading = false;
            self.requested_for = None;
            self.loaded_for = None;
            return if had_state {
                RequestOutcome::Cleared
            } else {
                RequestOutcome::Unchanged
            };
        };

        let same_request = self.requested_for.as_ref() == Some(&args);
        if !force && same_request && (self.loading || source.caches()) {
            return RequestOutcome::Unchanged;
        }

        if !same_request {
            self.options.clear();
            self.loaded_for = None;
        }
        self.generation = next_generation();
        self.loading = true;
        self.requested_for = Some(args.clone());
        debug!("requesting options for {target} (generation {})", self.generation);
        RequestOutcome::Issued(FetchTicket {
            target,
            generation: self.generation,
            function: source.function.clone(),
            args,
        })
    }

    /// Apply a completed fetch. Returns false when the result is stale.
    pub fn complete(&mut self, ticket: &FetchTicket, result: Result<Vec<FieldOption>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "discarding stale options for {} (generation {} superseded by {})",
                ticket.target, ticket.generation, self.generation
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(options) => {
                self.options = options;
                self.loaded_for = Some(ticket.args.clone());
            }
            Err(err) => {
                error!("options fetch for {} failed: {err:#}", ticket.target);
                self.options.clear();
                self.loaded_for = None;
            }
        }
        true
    }

    /// Drop everything, invalidating any fetch still in flight.
    pub fn reset(&mut self) {
        *self = OptionsSlot {
            generation: next_generation(),
            ..OptionsSlot::default()
        };
    }
}
