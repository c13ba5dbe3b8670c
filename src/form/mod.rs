pub mod condition;
pub mod convert;
pub mod defaults;
mod error;
pub mod flow;
pub mod options;
pub mod state;
pub mod tree;
pub mod validation;

pub use condition::{ValueScope, evaluate, should_show};
pub use error::FormError;
pub use flow::{FlowChange, FlowMachine, FlowSelectOutcome, FlowState, FlowStepState};
pub use options::{
    FetchTarget, FetchTicket, FunctionRegistry, OptionsFunction, OptionsFuture, OptionsSlot,
    RequestOutcome,
};
pub use state::{ErrorMap, FormStore};
pub use validation::{
    CrossValidator, CustomValidator, PasswordStrength, ValidatorRegistry, password_strength,
    validate,
};
