#![deny(rust_2018_idioms)]

pub mod app;
pub mod domain;
pub mod form;
pub mod presentation;


pub use app::{EngineOptions, FormEngine, FormEvent, StepTransition, SubmitOutcome};
pub use domain::{FieldOption, FormConfig, parse_form_config};
pub use form::{FunctionRegistry, ValidatorRegistry};

pub mod prelude {
    pub use super::{
        EngineOptions, FieldOption, FormConfig, FormEngine, FormEvent, FunctionRegistry,
        StepTransition, SubmitOutcome, ValidatorRegistry, parse_form_config,
    };
    pub use crate::presentation::{FieldRenderer, OutlineRenderer, render_form};
}
