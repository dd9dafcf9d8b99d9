//! Validation rule set and result types.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{CategorySet, FieldDefinition, FieldsConfig};

/// Accumulated outcome of checking a batch.
///
/// `is_valid` flips to false on the first error and never flips back.
/// Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append another result's messages, keeping order.
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// What to do with a repeated `(category, name)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateHandling {
    Allow,
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeCase {
    #[default]
    None,
    Lower,
    Upper,
    Title,
}

impl NormalizeCase {
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::None => value.to_string(),
            Self::Lower => value.to_lowercase(),
            Self::Upper => value.to_uppercase(),
            Self::Title => title_case(value),
        }
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Carried through from rule documents; no check consults it.
    #[serde(default)]
    pub allow_empty_values: bool,
    #[serde(default = "default_true")]
    pub trim_whitespace: bool,
    #[serde(default)]
    pub normalize_case: NormalizeCase,
    #[serde(default)]
    pub duplicate_handling: DuplicateHandling,
}

impl Default for DataQuality {
    fn default() -> Self {
        Self {
            allow_empty_values: false,
            trim_whitespace: true,
            normalize_case: NormalizeCase::None,
            duplicate_handling: DuplicateHandling::Warn,
        }
    }
}

/// A string-dispatched rule applied to one field after the per-field checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomValidator {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl CustomValidator {
    pub fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("Custom validation failed for {}", self.field))
    }
}

/// Declarative checks for one validation run. Never mutated while it runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRuleSet {
    #[serde(default)]
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub field_types: IndexMap<String, FieldDefinition>,
    #[serde(default)]
    pub data_quality: DataQuality,
    #[serde(default)]
    pub custom_validators: Vec<CustomValidator>,
}

/// On-disk wrapper: `{ "validation_rules": { ... } }`.
#[derive(Debug, Deserialize, Serialize)]
struct RuleDocument {
    validation_rules: ValidationRuleSet,
}

impl ValidationRuleSet {
    /// Read a persisted rule document, or synthesise one from configuration
    /// when the file is absent or unusable.
    pub fn load_or_default(path: &Path, fields: &FieldsConfig, categories: &CategorySet) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<RuleDocument>(&text) {
                Ok(doc) => {
                    tracing::info!(path = %path.display(), "Loaded validation rules");
                    return doc.validation_rules;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Invalid validation rules, using defaults");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No validation rules file, synthesising defaults");
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read validation rules, using defaults");
            }
        }
        Self::from_config(fields, categories)
    }

    /// Rule set derived from field definitions and configured categories.
    pub fn from_config(fields: &FieldsConfig, categories: &CategorySet) -> Self {
        let mut field_types = IndexMap::new();
        for (name, def) in &fields.field_definitions {
            let mut rules = FieldDefinition {
                field_type: def.field_type,
                required: def.required,
                description: def.description.clone(),
                ..FieldDefinition::default()
            };
            if def.field_type.is_textual() {
                rules.max_length = def.max_length;
            }
            field_types.insert(name.clone(), rules);
        }

        let mut custom_validators = Vec::new();
        if !categories.is_empty() {
            if let Some(rules) = field_types.get_mut("category") {
                rules.allowed_values = Some(
                    categories
                        .keys()
                        .map(|k| serde_json::Value::String(k.to_string()))
                        .collect(),
                );
            }
            custom_validators.push(CustomValidator {
                name: "category_consistency".into(),
                field: "category".into(),
                rule: "must_exist_in_categories_config".into(),
                message: Some("Category must be defined in categories configuration".into()),
            });
        }

        Self {
            required_columns: fields.required_fields.clone(),
            field_types,
            data_quality: DataQuality::default(),
            custom_validators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::FieldType;
    use crate::config::defaults;
    use serde_json::json;

    #[test]
    fn first_error_invalidates_result() {
        let mut result = ValidationResult::new();
        result.add_warning("just a note");
        assert!(result.is_valid);
        result.add_error("broken");
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["broken"]);
    }

    #[test]
    fn merge_keeps_order_and_validity() {
        let mut a = ValidationResult::new();
        a.add_warning("w1");
        let mut b = ValidationResult::new();
        b.add_error("e1");
        b.add_warning("w2");
        a.merge(b);
        assert!(!a.is_valid);
        assert_eq!(a.warnings, vec!["w1", "w2"]);
    }

    #[test]
    fn title_case_splits_on_non_letters() {
        assert_eq!(NormalizeCase::Title.apply("iron SWORD-of doom"), "Iron Sword-Of Doom");
        assert_eq!(NormalizeCase::Upper.apply("axe"), "AXE");
    }

    #[test]
    fn data_quality_defaults_apply_to_partial_documents() {
        let rules: ValidationRuleSet = serde_json::from_value(json!({
            "data_quality": {"duplicate_handling": "error"}
        }))
        .unwrap();
        assert!(rules.data_quality.trim_whitespace);
        assert_eq!(rules.data_quality.duplicate_handling, DuplicateHandling::Error);
        assert_eq!(rules.data_quality.normalize_case, NormalizeCase::None);
    }

    #[test]
    fn synthesised_rules_follow_configuration() {
        let fields: FieldsConfig = serde_json::from_value(json!({
            "required_fields": ["category", "name"],
            "field_definitions": {
                "category": {"type": "string", "required": true},
                "name": {"type": "string", "required": true, "max_length": 40},
                "attack": {"type": "integer", "max_length": 3, "min_value": 0}
            }
        }))
        .unwrap();
        let rules = ValidationRuleSet::from_config(&fields, &defaults::categories());

        assert_eq!(rules.required_columns, vec!["category", "name"]);
        assert_eq!(rules.field_types["name"].max_length, Some(40));
        assert_eq!(rules.field_types["attack"].field_type, FieldType::Integer);
        assert_eq!(rules.field_types["attack"].max_length, None);
        assert_eq!(rules.field_types["attack"].min_value, None);
        assert_eq!(
            rules.field_types["category"].allowed_values.as_ref().unwrap().len(),
            3
        );
        assert_eq!(rules.custom_validators[0].rule, "must_exist_in_categories_config");
    }

    #[test]
    fn no_categories_means_no_consistency_validator() {
        let rules = ValidationRuleSet::from_config(&defaults::fields(), &CategorySet::new());
        assert!(rules.custom_validators.is_empty());
        assert!(rules.field_types.is_empty());
    }

    #[test]
    fn load_or_default_reads_wrapped_document() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("validation.json");
        std::fs::write(
            &path,
            json!({"validation_rules": {"required_columns": ["name"]}}).to_string(),
        )
        .unwrap();

        let rules = ValidationRuleSet::load_or_default(&path, &defaults::fields(), &defaults::categories());
        assert_eq!(rules.required_columns, vec!["name"]);
        assert!(rules.custom_validators.is_empty());
    }

    #[test]
    fn load_or_default_synthesises_on_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("validation.json");
        std::fs::write(&path, "{nope").unwrap();

        let rules = ValidationRuleSet::load_or_default(&path, &defaults::fields(), &defaults::categories());
        assert_eq!(rules.required_columns, vec!["category", "name"]);
        assert_eq!(rules.custom_validators.len(), 1);
    }
}
