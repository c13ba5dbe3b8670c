use std::time::Duration;

use crate::domain::ValidationTrigger;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Form submitted successfully!";
pub const DEFAULT_ERROR_MESSAGE: &str = "There was an error submitting the form. Please try again.";
pub const DEFAULT_LOADING_MESSAGE: &str = "Submitting...";

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Overrides the configuration's `validation.showErrorsOn` when set.
    pub validation_trigger: Option<ValidationTrigger>,
    pub fetch_timeout: Option<Duration>,
    pub simulated_latency: Duration,
    pub reset_dependents: bool,
    pub default_success_message: String,
    pub default_error_message: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            validation_trigger: None,
            fetch_timeout: None,
            simulated_latency: Duration::ZERO,
            reset_dependents: true,
            default_success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            default_error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl EngineOptions {
    pub fn with_validation_trigger(mut self, trigger: ValidationTrigger) -> Self {
        self.validation_trigger = Some(trigger);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn with_simulated_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = latency;
        self
    }

    pub fn with_reset_dependents(mut self, enabled: bool) -> Self {
        self.reset_dependents = enabled;
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.default_success_message = message.into();
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.default_error_message = message.into();
        self
    }
}
