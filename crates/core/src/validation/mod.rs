//! Data validation engine.
//!
//! Rule types, the per-field and batch evaluator, the custom validator
//! vocabulary, and plain-text reports. No database dependencies.

pub mod custom;
pub mod evaluator;
pub mod report;
pub mod rules;

pub use evaluator::{validate, validate_basic, validate_comprehensive};
pub use report::generate_report;
pub use rules::{
    CustomValidator, DataQuality, DuplicateHandling, NormalizeCase, ValidationResult,
    ValidationRuleSet,
};
