//! Plain-text validation reports.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::rules::ValidationResult;
use crate::error::CoreError;

const RULE: &str = "============================================================";
const SUBRULE: &str = "--------------------";

/// Render `result` and, when `output` is given, also write it there.
pub fn generate_report(result: &ValidationResult, output: Option<&Path>) -> Result<String, CoreError> {
    let report = render_report(result, Utc::now());
    if let Some(path) = output {
        std::fs::write(path, &report).map_err(|e| CoreError::io(path, e))?;
        tracing::info!(path = %path.display(), "Validation report written");
    }
    Ok(report)
}

pub fn render_report(result: &ValidationResult, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}\nDATA VALIDATION REPORT\n{RULE}");
    let _ = writeln!(out, "Generated: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S"));

    let status = if result.is_valid { "PASSED" } else { "FAILED" };
    let _ = writeln!(out, "SUMMARY\n{SUBRULE}");
    let _ = writeln!(out, "Overall Status: {status}");
    let _ = writeln!(out, "Total Errors: {}", result.errors.len());
    let _ = writeln!(out, "Total Warnings: {}\n", result.warnings.len());

    for (title, messages) in [("ERRORS", &result.errors), ("WARNINGS", &result.warnings)] {
        if messages.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{title}\n{SUBRULE}");
        for (i, message) in messages.iter().enumerate() {
            let _ = writeln!(out, "{:3}. {message}", i + 1);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "RECOMMENDATIONS\n{SUBRULE}");
    if !result.errors.is_empty() {
        out.push_str("• Fix all errors before proceeding with data import\n");
        out.push_str("• Review field mappings and data types in configuration\n");
        out.push_str("• Check CSV file format and encoding\n");
    } else {
        out.push_str("• Data validation passed successfully\n");
        if !result.warnings.is_empty() {
            out.push_str("• Review warnings for potential data quality improvements\n");
        }
    }
    out
}
