mod engine;
mod events;
mod navigation;
mod options;
mod status;

pub use engine::{FormEngine, FormEngineBuilder, SubmitFuture, SubmitHandler, SubmitOutcome};
pub use events::{FormEvent, Listener};
pub use navigation::{StepNavigator, StepTransition};
pub use options::{
    DEFAULT_ERROR_MESSAGE, DEFAULT_LOADING_MESSAGE, DEFAULT_SUCCESS_MESSAGE, EngineOptions,
};
pub use status::{READY_STATUS, StatusKind, StatusLine};
