use std::{collections::HashMap, fmt, sync::Arc};

use log::warn;
use fancy_regex::Regex;
use serde_json::Value;

use crate::domain::{CrossValidationRule, LeafField, ValidationRule, ValidationRuleSet};

use super::{
    condition::ValueScope,
    convert::{as_number, is_missing, value_to_string, values_equal},
};

/// `(value, allValues) -> error message`; `None` means the value passes.
pub type CustomValidator = Arc<dyn Fn(&Value, &ValueScope<'_>) -> Option<String> + Send + Sync>;

/// `(allValues, fieldPath, dependsOn) -> passes`.
pub type CrossValidator = Arc<dyn Fn(&ValueScope<'_>, &str, &[String]) -> bool + Send + Sync>;

const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Closed registry of named validators, fixed when the engine is built.
#[derive(Clone)]
pub struct ValidatorRegistry {
    custom: HashMap<String, CustomValidator>,
    cross: HashMap<String, CrossValidator>,
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut custom: Vec<_> = self.custom.keys().collect();
        custom.sort();
        let mut cross: Vec<_> = self.cross.keys().collect();
        cross.sort();
        f.debug_struct("ValidatorRegistry")
            .field("custom", &custom)
            .field("cross", &cross)
            .finish()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        Self {
            custom: HashMap::new(),
            cross: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("validatePasswordStrength", |value, _| password_strength_error(value));
        registry.register("validatePasswordMatch", |value, scope| {
            let password = scope.lookup("password").unwrap_or(&Value::Null);
            if values_equal(value, password) {
                None
            } else {
                Some("Passwords do not match.".to_string())
            }
        });
        registry.register("validateFullName", |value, _| full_name_error(value));
        registry.register("luhnCheck", |value, _| {
            let text = value_to_string(value);
            if text.trim().is_empty() || luhn_valid(&text) {
                None
            } else {
                Some("Please enter a valid card number.".to_string())
            }
        });
        registry.register_cross("isAfter", |scope, field, depends_on| {
            let Some(other) = depends_on.first() else {
                return true;
            };
            match (scope.lookup(field), scope.lookup(other)) {
                (Some(Value::String(primary)), Some(Value::String(dependency)))
                    if !primary.is_empty() && !dependency.is_empty() =>
                {
                    primary.as_str() >= dependency.as_str()
                }
                _ => true,
            }
        });
        registry.register_cross("matchesField", |scope, field, depends_on| {
            let Some(other) = depends_on.first() else {
                return true;
            };
            let null = Value::Null;
            values_equal(
                scope.lookup(field).unwrap_or(&null),
                scope.lookup(other).unwrap_or(&null),
            )
        });
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, validator: F) -> &mut Self
    where
        F: Fn(&Value, &ValueScope<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(validator));
        self
    }

    pub fn register_cross<F>(&mut self, name: impl Into<String>, validator: F) -> &mut Self
    where
        F: Fn(&ValueScope<'_>, &str, &[String]) -> bool + Send + Sync + 'static,
    {
        self.cross.insert(name.into(), Arc::new(validator));
        self
    }

    pub fn custom(&self, name: &str) -> Option<&CustomValidator> {
        self.custom.get(name)
    }

    pub fn cross(&self, name: &str) -> Option<&CrossValidator> {
        self.cross.get(name)
    }
}

/// Run a rule set against one value and return the first failing message.
///
/// Order: required, string length and pattern, numeric range, custom.
pub fn validate(
    rules: &ValidationRuleSet,
    numeric: bool,
    value: Option<&Value>,
    scope: &ValueScope<'_>,
    registry: &ValidatorRegistry,
) -> Option<String> {
    if let Some(rule) = rules.required.as_ref().filter(|rule| rule.is_enabled())
        && is_missing(value)
    {
        return Some(message_or(rule, "This field is required."));
    }

    if let Some(Value::String(text)) = value
        && !text.is_empty()
    {
        let length = text.chars().count() as f64;
        if let Some(rule) = &rules.min_length
            && let Some(limit) = threshold(rule, "minLength")
            && length < limit
        {
            return Some(message_or(rule, "Value is too short."));
        }
        if let Some(rule) = &rules.max_length
            && let Some(limit) = threshold(rule, "maxLength")
            && length > limit
        {
            return Some(message_or(rule, "Value is too long."));
        }
        if let Some(rule) = &rules.pattern
            && !pattern_matches(rule, text)
        {
            return Some(message_or(rule, "Value has an invalid format."));
        }
    }

    if numeric
        && let Some(number) = value.and_then(as_number)
    {
        if let Some(rule) = &rules.min
            && let Some(limit) = threshold(rule, "min")
            && number < limit
        {
            return Some(message_or(rule, "Value is too small."));
        }
        if let Some(rule) = &rules.max
            && let Some(limit) = threshold(rule, "max")
            && number > limit
        {
            return Some(message_or(rule, "Value is too large."));
        }
    }

    if let Some(custom) = &rules.custom {
        match registry.custom(&custom.function) {
            Some(validator) => {
                let null = Value::Null;
                if let Some(reported) = validator(value.unwrap_or(&null), scope) {
                    if custom.message.is_empty() {
                        return Some(reported);
                    }
                    return Some(custom.message.clone());
                }
            }
            None => warn!(
                "custom validator '{}' is not registered; treating value as valid",
                custom.function
            ),
        }
    }

    None
}

/// Validate a leaf: its rule set, then its cross-field rules.
pub fn validate_leaf(
    field: &LeafField,
    path: &str,
    value: Option<&Value>,
    scope: &ValueScope<'_>,
    registry: &ValidatorRegistry,
) -> Option<String> {
    if let Some(rules) = &field.validation
        && let Some(message) = validate(rules, field.kind.is_numeric(), value, scope, registry)
    {
        return Some(message);
    }
    validate_cross(&field.cross_validation, path, scope, registry)
}

fn validate_cross(
    rules: &[CrossValidationRule],
    path: &str,
    scope: &ValueScope<'_>,
    registry: &ValidatorRegistry,
) -> Option<String> {
    for rule in rules {
        let Some(validator) = registry.cross(&rule.rule) else {
            warn!("cross-field rule '{}' is not registered", rule.rule);
            continue;
        };
        if !validator(scope, path, &rule.depends_on) {
            return Some(if rule.message.is_empty() {
                "Value is inconsistent with related fields.".to_string()
            } else {
                rule.message.clone()
            });
        }
    }
    None
}

fn message_or(rule: &ValidationRule, fallback: &str) -> String {
    if rule.message.is_empty() {
        fallback.to_string()
    } else {
        rule.message.clone()
    }
}

fn threshold(rule: &ValidationRule, name: &str) -> Option<f64> {
    let limit = rule.threshold();
    if limit.is_none() {
        warn!("{name} rule has a non-numeric threshold {}", rule.value);
    }
    limit
}

fn pattern_matches(rule: &ValidationRule, text: &str) -> bool {
    let Some(source) = rule.value.as_str() else {
        warn!("pattern rule value {} is not a string", rule.value);
        return true;
    };
    let regex = match Regex::new(source) {
        Ok(regex) => regex,
        Err(err) => {
            warn!("pattern '{source}' does not compile: {err}");
            return true;
        }
    };
    regex.is_match(text).unwrap_or_else(|err| {
        warn!("pattern '{source}' gave up on input: {err}");
        true
    })
}

fn password_strength_error(value: &Value) -> Option<String> {
    let Value::String(text) = value else {
        return None;
    };
    if text.is_empty() {
        return None;
    }
    let upper = text.chars().any(|c| c.is_ascii_uppercase());
    let lower = text.chars().any(|c| c.is_ascii_lowercase());
    let digit = text.chars().any(|c| c.is_ascii_digit());
    let special = text.chars().any(|c| SPECIAL_CHARACTERS.contains(c));
    if upper && lower && digit && special {
        None
    } else {
        Some("Password must contain uppercase, lowercase, number, and special character.".into())
    }
}

fn full_name_error(value: &Value) -> Option<String> {
    let Value::String(text) = value else {
        return None;
    };
    if text.trim().is_empty() || text.split_whitespace().count() >= 2 {
        None
    } else {
        Some("Please enter both first and last name.".to_string())
    }
}

fn luhn_valid(raw: &str) -> bool {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(idx, digit)| {
            if idx % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    pub score: u8,
    pub label: &'static str,
}

/// Score a password from 0 to 5 for strength meters.
pub fn password_strength(password: &str, min_length: usize) -> PasswordStrength {
    const LABELS: [&str; 6] = ["Very Weak", "Weak", "Fair", "Good", "Strong", "Very Strong"];
    if password.is_empty() {
        return PasswordStrength {
            score: 0,
            label: "No password",
        };
    }
    let checks = [
        password.chars().count() >= min_length,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
    ];
    let score = checks.iter().filter(|passed| **passed).count() as u8;
    PasswordStrength {
        score,
        label: LABELS[score as usize],
    }
}
