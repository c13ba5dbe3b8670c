mod parser;
mod path;
mod schema;

pub use parser::parse_form_config;
pub use path::{FieldPath, Segment, reindex_after_removal, reindex_key};
pub use schema::{
    Condition, ConditionLogic, ConditionOperator, CrossValidationRule, CustomRule, DependsOn,
    DynamicFlowField, FieldNode, FieldOption, FlowStep, FormConfig, FormKind, FormStep, LeafField,
    LeafKind, OptionsSource, RepeatableField, SectionField, ShowWhen, SubmitMessages,
    ValidationBehaviour, ValidationRule, ValidationRuleSet, ValidationTrigger,
};
