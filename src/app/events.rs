use serde_json::Value;

use crate::form::FetchTarget;

/// Notifications delivered to subscribers after a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    ValuesChanged(Value),
    StepChanged(usize),
    OptionsLoaded(FetchTarget),
    Submitted,
    SubmitFailed(String),
}

pub type Listener = Box<dyn FnMut(&FormEvent) + Send>;

#[derive(Default)]
pub(crate) struct EventHub {
    listeners: Vec<Listener>,
}

impl EventHub {
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: FormEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}
