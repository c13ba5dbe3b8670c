use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    #[default]
    Standard,
    Wizard,
}

/// Root envelope of a form configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: FormKind,
    #[serde(default)]
    pub steps: Vec<FormStep>,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
    #[serde(default)]
    pub on_submit: Option<SubmitMessages>,
    #[serde(default)]
    pub submit_button_label: Option<String>,
    #[serde(default)]
    pub validation: Option<ValidationBehaviour>,
}

impl FormConfig {
    pub fn is_wizard(&self) -> bool {
        self.kind == FormKind::Wizard && !self.steps.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStep {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMessages {
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub loading_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationTrigger {
    #[default]
    Blur,
    Change,
    Submit,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationBehaviour {
    #[serde(default)]
    pub show_errors_on: ValidationTrigger,
    #[serde(default)]
    pub validate_on_change: bool,
}

impl ValidationBehaviour {
    pub fn trigger(&self) -> ValidationTrigger {
        if self.validate_on_change {
            ValidationTrigger::Change
        } else {
            self.show_errors_on
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
            icon: None,
        }
    }
}

/// One node of the field tree.
#[derive(Debug, Clone)]
pub enum FieldNode {
    Leaf(LeafField),
    Section(SectionField),
    Repeatable(RepeatableField),
    DynamicFlow(DynamicFlowField),
}

impl FieldNode {
    pub fn name(&self) -> &str {
        match self {
            FieldNode::Leaf(field) => &field.name,
            FieldNode::Section(section) => &section.name,
            FieldNode::Repeatable(field) => &field.name,
            FieldNode::DynamicFlow(field) => &field.name,
        }
    }

    pub fn show_when(&self) -> Option<&ShowWhen> {
        match self {
            FieldNode::Leaf(field) => field.show_when.as_ref(),
            FieldNode::Section(section) => section.show_when.as_ref(),
            FieldNode::Repeatable(field) => field.show_when.as_ref(),
            FieldNode::DynamicFlow(field) => field.show_when.as_ref(),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            FieldNode::Leaf(field) => field.kind.as_str(),
            FieldNode::Section(_) => "section",
            FieldNode::Repeatable(_) => "repeatable",
            FieldNode::DynamicFlow(_) => "dynamic-flow",
        }
    }
}

impl<'de> Deserialize<'de> for FieldNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let tag = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("text")
            .to_string();
        let node = match tag.as_str() {
            "section" => FieldNode::Section(serde_json::from_value(raw).map_err(de::Error::custom)?),
            "repeatable" => {
                FieldNode::Repeatable(serde_json::from_value(raw).map_err(de::Error::custom)?)
            }
            "dynamic-flow" => {
                FieldNode::DynamicFlow(serde_json::from_value(raw).map_err(de::Error::custom)?)
            }
            _ => FieldNode::Leaf(serde_json::from_value(raw).map_err(de::Error::custom)?),
        };
        Ok(node)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LeafKind {
    Text,
    Email,
    Password,
    Number,
    Date,
    Tel,
    Textarea,
    Select,
    MultiSelect,
    AutoComplete,
    Radio,
    Checkbox,
    Switch,
    Color,
    File,
    Unsupported(String),
}

impl From<String> for LeafKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "text" => LeafKind::Text,
            "email" => LeafKind::Email,
            "password" => LeafKind::Password,
            "number" => LeafKind::Number,
            "date" => LeafKind::Date,
            "tel" => LeafKind::Tel,
            "textarea" => LeafKind::Textarea,
            "select" => LeafKind::Select,
            "multi-select" => LeafKind::MultiSelect,
            "auto-complete" => LeafKind::AutoComplete,
            "radio" => LeafKind::Radio,
            "checkbox" => LeafKind::Checkbox,
            "switch" => LeafKind::Switch,
            "color" => LeafKind::Color,
            "file" => LeafKind::File,
            _ => LeafKind::Unsupported(raw),
        }
    }
}

impl LeafKind {
    pub fn as_str(&self) -> &str {
        match self {
            LeafKind::Text => "text",
            LeafKind::Email => "email",
            LeafKind::Password => "password",
            LeafKind::Number => "number",
            LeafKind::Date => "date",
            LeafKind::Tel => "tel",
            LeafKind::Textarea => "textarea",
            LeafKind::Select => "select",
            LeafKind::MultiSelect => "multi-select",
            LeafKind::AutoComplete => "auto-complete",
            LeafKind::Radio => "radio",
            LeafKind::Checkbox => "checkbox",
            LeafKind::Switch => "switch",
            LeafKind::Color => "color",
            LeafKind::File => "file",
            LeafKind::Unsupported(raw) => raw,
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, LeafKind::MultiSelect | LeafKind::Checkbox)
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self, LeafKind::Switch)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, LeafKind::Number)
    }

    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            LeafKind::Select
                | LeafKind::MultiSelect
                | LeafKind::AutoComplete
                | LeafKind::Radio
                | LeafKind::Checkbox
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafField {
    pub name: String,
    #[serde(rename = "type", default = "default_leaf_kind")]
    pub kind: LeafKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub validation: Option<ValidationRuleSet>,
    #[serde(default)]
    pub show_when: Option<ShowWhen>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub options_source: Option<OptionsSource>,
    #[serde(default)]
    pub cross_validation: Vec<CrossValidationRule>,
    #[serde(default)]
    pub show_password_strength: bool,
    #[serde(default)]
    pub character_counter: bool,
}

fn default_leaf_kind() -> LeafKind {
    LeafKind::Text
}

impl LeafField {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionField {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub collapsible: bool,
    #[serde(default)]
    pub default_collapsed: bool,
    #[serde(default)]
    pub columns: Option<u32>,
    #[serde(default)]
    pub show_when: Option<ShowWhen>,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
}

impl SectionField {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatableField {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub section_title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub add_button_label: Option<String>,
    #[serde(default)]
    pub remove_button_label: Option<String>,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub validation: Option<ValidationRuleSet>,
    #[serde(default)]
    pub show_when: Option<ShowWhen>,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
}

impl RepeatableField {
    pub fn min_items(&self) -> Option<usize> {
        self.validation
            .as_ref()
            .and_then(|rules| rules.min.as_ref())
            .and_then(ValidationRule::threshold_usize)
    }

    pub fn max_item_count(&self) -> Option<usize> {
        self.validation
            .as_ref()
            .and_then(|rules| rules.max.as_ref())
            .and_then(ValidationRule::threshold_usize)
            .or(self.max_items)
    }

    pub fn display_title(&self) -> &str {
        self.section_title
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFlowField {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub validation: Option<ValidationRuleSet>,
    #[serde(default)]
    pub show_when: Option<ShowWhen>,
    #[serde(default)]
    pub flow: Vec<FlowStep>,
    pub output_step_id: String,
    #[serde(default)]
    pub show_all_steps: bool,
}

impl DynamicFlowField {
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.flow.iter().position(|step| step.id == step_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    pub options_source: OptionsSource,
    #[serde(default)]
    pub validation: Option<ValidationRuleSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    One(String),
    Many(Vec<String>),
}

impl DependsOn {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            DependsOn::One(path) => vec![path.as_str()],
            DependsOn::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_single(&self, target: &str) -> bool {
        matches!(self, DependsOn::One(path) if path == target)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsSource {
    #[serde(alias = "functionName")]
    pub function: String,
    #[serde(default)]
    pub depends_on: Option<DependsOn>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub cache: Option<bool>,
}

impl OptionsSource {
    pub fn caches(&self) -> bool {
        self.cache.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub message: String,
}

impl ValidationRule {
    /// A rule without a `value` (or with `false`) is switched off.
    pub fn is_enabled(&self) -> bool {
        !matches!(self.value, Value::Null | Value::Bool(false))
    }

    pub fn threshold(&self) -> Option<f64> {
        match &self.value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn threshold_usize(&self) -> Option<usize> {
        self.threshold()
            .filter(|value| *value >= 0.0)
            .map(|value| value as usize)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomRule {
    #[serde(alias = "functionName")]
    pub function: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRuleSet {
    pub required: Option<ValidationRule>,
    pub min_length: Option<ValidationRule>,
    pub max_length: Option<ValidationRule>,
    pub min: Option<ValidationRule>,
    pub max: Option<ValidationRule>,
    pub pattern: Option<ValidationRule>,
    pub custom: Option<CustomRule>,
}

impl ValidationRuleSet {
    pub fn is_required(&self) -> bool {
        self.required
            .as_ref()
            .map(ValidationRule::is_enabled)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossValidationRule {
    pub rule: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ConditionOperator {
    Eq,
    Neq,
    In,
    NotIn,
    Gt,
    Lt,
    Gte,
    Lte,
    IsTruthy,
    IsFalsy,
    Unknown(String),
}

impl From<String> for ConditionOperator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "eq" | "===" => ConditionOperator::Eq,
            "neq" | "!==" => ConditionOperator::Neq,
            "in" | "includes" => ConditionOperator::In,
            "notIn" | "not-includes" => ConditionOperator::NotIn,
            "gt" => ConditionOperator::Gt,
            "lt" => ConditionOperator::Lt,
            "gte" => ConditionOperator::Gte,
            "lte" => ConditionOperator::Lte,
            "isTruthy" | "is-truthy" => ConditionOperator::IsTruthy,
            "isFalsy" | "is-falsy" => ConditionOperator::IsFalsy,
            _ => ConditionOperator::Unknown(raw),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLogic {
    #[default]
    And,
    Or,
}

/// Flat condition group; nested groups are not part of the format.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowWhen {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: ConditionLogic,
}
