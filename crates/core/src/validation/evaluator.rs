//! Rule evaluator. Pure logic, no I/O.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::custom::{prefix_regex, CustomRule};
use super::rules::{DuplicateHandling, ValidationResult, ValidationRuleSet};
use crate::coercion::{value_type_name, FieldType};
use crate::config::{CategorySet, FieldDefinition, FieldsConfig};
use crate::item::{is_standard_field, is_truthy, Item};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid regex"));

/// One message produced by a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Error(String),
    Warning(String),
}

impl ValidationResult {
    fn record(&mut self, finding: Finding) {
        match finding {
            Finding::Error(m) => self.add_error(m),
            Finding::Warning(m) => self.add_warning(m),
        }
    }
}

fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

fn allowed_values_display(values: &[Value]) -> String {
    serde_json::to_string(values).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Per-field checks
// ---------------------------------------------------------------------------

/// Rules for one field with the pattern compiled once per run.
pub struct FieldChecker<'a> {
    field: &'a str,
    rules: &'a FieldDefinition,
    pattern: Option<Regex>,
}

impl<'a> FieldChecker<'a> {
    /// Returns the checker and, when the pattern does not compile, a
    /// warning. The pattern check is then skipped.
    pub fn new(field: &'a str, rules: &'a FieldDefinition) -> (Self, Option<Finding>) {
        let mut warning = None;
        let pattern = match rules.pattern.as_deref() {
            None | Some("") => None,
            Some(p) => match prefix_regex(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warning = Some(Finding::Warning(format!(
                        "Invalid regex pattern for field '{field}': {e}"
                    )));
                    None
                }
            },
        };
        (Self { field, rules, pattern }, warning)
    }

    pub fn field(&self) -> &str {
        self.field
    }

    /// Check `value` found in 1-based `row`.
    ///
    /// A required field that is empty yields a single error and no further
    /// checks; an empty optional field passes.
    pub fn check(&self, value: Option<&Value>, row: usize) -> Vec<Finding> {
        let field = self.field;
        let rules = self.rules;
        let mut errors: Vec<String> = Vec::new();

        match value {
            Some(value) if !is_empty_value(Some(value)) => self.check_present(value, &mut errors),
            _ if rules.required => errors.push(format!("Required field '{field}' is empty")),
            _ => {}
        }

        errors
            .into_iter()
            .map(|message| Finding::Error(format!("Row {row}: {message}")))
            .collect()
    }

    fn check_present(&self, value: &Value, errors: &mut Vec<String>) {
        let field = self.field;
        let rules = self.rules;
        let field_type = rules.field_type;

        if !field_type.accepts(value) {
            errors.push(format!(
                "Field '{field}' has invalid type (expected {field_type}, got {})",
                value_type_name(value)
            ));
        }

        if let (true, Some(text)) = (field_type.is_textual(), value.as_str()) {
            let len = text.chars().count();
            if let Some(min) = rules.min_length.filter(|min| len < *min) {
                errors.push(format!("Field '{field}' is too short (minimum {min} characters)"));
            }
            if let Some(max) = rules.max_length.filter(|max| len > *max) {
                errors.push(format!("Field '{field}' is too long (maximum {max} characters)"));
            }
            if self.pattern.as_ref().is_some_and(|re| !re.is_match(text)) {
                errors.push(format!("Field '{field}' does not match required pattern"));
            }
            if let Some(allowed) = rules.allowed_values.as_deref() {
                if !allowed.is_empty() && !allowed.contains(value) {
                    errors.push(format!(
                        "Field '{field}' has invalid value. Allowed values: {}",
                        allowed_values_display(allowed)
                    ));
                }
            }
        }

        if let (true, Some(number)) = (field_type.is_numeric(), value.as_f64()) {
            if let Some(min) = rules.min_value.filter(|min| number < *min) {
                errors.push(format!("Field '{field}' is below minimum value ({min})"));
            }
            if let Some(max) = rules.max_value.filter(|max| number > *max) {
                errors.push(format!("Field '{field}' is above maximum value ({max})"));
            }
        }

        if let Some(text) = value.as_str() {
            match field_type {
                FieldType::Email if !EMAIL_RE.is_match(text) => {
                    errors.push(format!("Field '{field}' is not a valid email address"));
                }
                FieldType::Url if !URL_RE.is_match(text) => {
                    errors.push(format!("Field '{field}' is not a valid URL"));
                }
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Batch validation
// ---------------------------------------------------------------------------

/// Validate a batch. With a rule set the comprehensive engine runs (and may
/// normalise item values in place); without one only the basic checks from
/// the field configuration apply.
pub fn validate(
    items: &mut [Item],
    rules: Option<&ValidationRuleSet>,
    fields: &FieldsConfig,
    categories: &CategorySet,
) -> ValidationResult {
    match rules {
        Some(rules) => validate_comprehensive(items, rules, fields, categories),
        None => validate_basic(items, fields),
    }
}

/// Required-field presence plus declared type, length and range checks.
pub fn validate_basic(items: &[Item], fields: &FieldsConfig) -> ValidationResult {
    let mut result = ValidationResult::new();
    if items.is_empty() {
        result.add_warning("No items to validate");
        return result;
    }

    for (index, item) in items.iter().enumerate() {
        let row = index + 1;

        for required in &fields.required_fields {
            if !item.field_value(required).is_some_and(|v| is_truthy(&v)) {
                result.add_error(format!("Item {row}: Missing required field '{required}'"));
            }
        }

        for (name, def) in &fields.field_definitions {
            let Some(value) = item.field_value(name).filter(|v| !v.is_null()) else {
                continue;
            };
            let field_type = def.field_type;
            if !field_type.accepts(&value) {
                result.add_error(format!(
                    "Item {row}: Field '{name}' has invalid type (expected {field_type})"
                ));
            }
            if let (true, Some(text), Some(max)) =
                (field_type.is_textual(), value.as_str(), def.max_length)
            {
                if text.chars().count() > max {
                    result.add_error(format!(
                        "Item {row}: Field '{name}' exceeds maximum length ({max})"
                    ));
                }
            }
            if let (true, Some(number)) = (field_type.is_numeric(), value.as_f64()) {
                if let Some(min) = def.min_value.filter(|min| number < *min) {
                    result.add_error(format!("Item {row}: Field '{name}' below minimum value ({min})"));
                }
                if let Some(max) = def.max_value.filter(|max| number > *max) {
                    result.add_error(format!("Item {row}: Field '{name}' above maximum value ({max})"));
                }
            }
        }
    }

    if result.is_valid {
        tracing::info!(items = items.len(), "Basic validation passed");
    }
    result
}

/// Full rule-set validation.
///
/// Per item, in order: whitespace trimming and case normalisation (written
/// back into the item), per-field checks, duplicate detection, custom
/// validators. Field names that resolve to nothing produce one warning and
/// are skipped for the whole batch.
pub fn validate_comprehensive(
    items: &mut [Item],
    rules: &ValidationRuleSet,
    fields: &FieldsConfig,
    categories: &CategorySet,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    if items.is_empty() {
        result.add_warning("No items to validate");
        return result;
    }

    let custom_keys: HashSet<String> = items
        .iter()
        .flat_map(|item| item.custom_fields.keys().cloned())
        .collect();
    let resolves = |name: &str| {
        is_standard_field(name) || fields.knows_field(name) || custom_keys.contains(name)
    };

    let mut checkers = Vec::new();
    for (name, field_rules) in &rules.field_types {
        if !resolves(name) {
            result.add_warning(format!(
                "Field '{name}' in validation rules does not match any known field, skipping"
            ));
            continue;
        }
        let (checker, warning) = FieldChecker::new(name, field_rules);
        if let Some(warning) = warning {
            result.record(warning);
        }
        checkers.push(checker);
    }

    let mut validators = Vec::new();
    for validator in &rules.custom_validators {
        if validator.field.is_empty() || validator.rule.is_empty() {
            continue;
        }
        if !resolves(&validator.field) {
            result.add_warning(format!(
                "Custom validator '{}' references unknown field '{}', skipping",
                validator.name, validator.field
            ));
            continue;
        }
        match CustomRule::parse(&validator.rule) {
            Ok(rule) => validators.push((validator, rule)),
            Err(e) => result.add_warning(format!(
                "Custom validator '{}' has a malformed rule '{}': {e}",
                validator.name, validator.rule
            )),
        }
    }

    let quality = &rules.data_quality;
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (index, item) in items.iter_mut().enumerate() {
        let row = index + 1;

        for checker in &checkers {
            let mut value = item.field_value(checker.field());
            if let Some(Value::String(raw)) = &value {
                let mut normalised = if quality.trim_whitespace {
                    raw.trim().to_string()
                } else {
                    raw.clone()
                };
                normalised = quality.normalize_case.apply(&normalised);
                if normalised != *raw {
                    item.set_field_value(checker.field(), Value::String(normalised.clone()));
                    value = Some(Value::String(normalised));
                }
            }

            for finding in checker.check(value.as_ref(), row) {
                result.record(finding);
            }
        }

        if quality.duplicate_handling != DuplicateHandling::Allow {
            let key = (item.category.clone(), item.name.clone());
            if seen.contains(&key) {
                let message = format!(
                    "Item {row}: Duplicate found - Category: '{}', Name: '{}'",
                    item.category, item.name
                );
                if quality.duplicate_handling == DuplicateHandling::Error {
                    result.add_error(message);
                } else {
                    result.add_warning(message);
                }
            } else {
                seen.insert(key);
            }
        }

        for (validator, rule) in &validators {
            let value = item.field_value(&validator.field);
            match rule.passes(value.as_ref(), categories) {
                Some(true) => {}
                Some(false) => {
                    let message = validator.message();
                    match rule {
                        CustomRule::MustExistInCategories => result.add_error(format!(
                            "Item {row}: {message} (found: '{}')",
                            value.as_ref().map(crate::item::value_to_text).unwrap_or_default()
                        )),
                        _ => result.add_error(format!("Item {row}: {message}")),
                    }
                }
                None => result.add_warning(format!(
                    "Item {row}: Unknown custom validator rule: {}",
                    validator.rule
                )),
            }
        }
    }

    tracing::info!(
        items = items.len(),
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "Comprehensive validation finished"
    );
    result
}
