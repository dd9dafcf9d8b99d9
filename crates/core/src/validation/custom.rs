//! Custom validator rule vocabulary.
//!
//! Rules are plain strings in the rule document:
//!
//! | Rule                             | Passes when                               |
//! |----------------------------------|-------------------------------------------|
//! | `must_exist_in_categories_config`| value is empty or a configured category key |
//! | `regex:<pattern>`                | value is empty or matches at its start    |
//! | `length_between:<min>,<max>`     | value is empty or has min..=max characters |
//! | `not_empty`                      | value is present and not blank            |

use regex::Regex;
use serde_json::Value;

use crate::config::CategorySet;
use crate::item::{is_truthy, value_to_text};

/// A parsed custom rule.
#[derive(Debug, Clone)]
pub enum CustomRule {
    MustExistInCategories,
    Regex(Regex),
    LengthBetween { min: usize, max: usize },
    NotEmpty,
    /// Not part of the vocabulary. Reported per item, never passes silently.
    Unknown(String),
}

/// Why a recognised rule could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("invalid regex: {0}")]
    InvalidRegex(String),
    #[error("length_between expects two integers, got '{0}'")]
    InvalidLengthRange(String),
}

/// Compile `pattern` so that it only matches at the start of the input.
pub fn prefix_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

impl CustomRule {
    pub fn parse(rule: &str) -> Result<Self, RuleParseError> {
        if rule == "must_exist_in_categories_config" {
            return Ok(Self::MustExistInCategories);
        }
        if rule == "not_empty" {
            return Ok(Self::NotEmpty);
        }
        if let Some(pattern) = rule.strip_prefix("regex:") {
            return prefix_regex(pattern)
                .map(Self::Regex)
                .map_err(|e| RuleParseError::InvalidRegex(e.to_string()));
        }
        if let Some(range) = rule.strip_prefix("length_between:") {
            let bounds: Vec<&str> = range.split(',').map(str::trim).collect();
            return match bounds.as_slice() {
                [min, max] => match (min.parse(), max.parse()) {
                    (Ok(min), Ok(max)) => Ok(Self::LengthBetween { min, max }),
                    _ => Err(RuleParseError::InvalidLengthRange(range.to_string())),
                },
                _ => Err(RuleParseError::InvalidLengthRange(range.to_string())),
            };
        }
        Ok(Self::Unknown(rule.to_string()))
    }

    /// Whether `value` passes. `None` for [`CustomRule::Unknown`], which has
    /// no verdict.
    pub fn passes(&self, value: Option<&Value>, categories: &CategorySet) -> Option<bool> {
        let present = value.is_some_and(is_truthy);
        let text = value.map(value_to_text).unwrap_or_default();

        let verdict = match self {
            Self::MustExistInCategories => !present || categories.contains(&text),
            Self::Regex(re) => !present || re.is_match(&text),
            Self::LengthBetween { min, max } => {
                let len = text.chars().count();
                !present || (*min..=*max).contains(&len)
            }
            Self::NotEmpty => present && !text.trim().is_empty(),
            Self::Unknown(_) => return None,
        };
        Some(verdict)
    }
}
