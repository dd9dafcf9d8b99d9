//! CSV ingestion and field mapping.
//!
//! Ingestion is lenient: problems are recorded in the returned
//! [`ValidationResult`] and the batch carries on. Rejecting a batch is the
//! validation engine's call, not this module's.

use std::collections::HashSet;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use serde_json::Value;

use crate::coercion::coerce;
use crate::config::FieldsConfig;
use crate::item::{is_truthy, Item};
use crate::validation::{ValidationResult, ValidationRuleSet};

/// Delimiters considered by [`sniff_delimiter`], in preference order.
pub const CANDIDATE_DELIMITERS: &[u8] = b",\t;|";

/// Bytes of the file inspected when detecting the dialect.
pub const SNIFF_SAMPLE_BYTES: usize = 1024;

const UTF8_BOM: char = '\u{feff}';

// ---------------------------------------------------------------------------
// Dialect detection
// ---------------------------------------------------------------------------

/// Occurrences of `delimiter` in `line` outside double-quoted sections.
fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Pick the delimiter whose per-line count is the same non-zero number on
/// every complete line of the sample. Ties go to the larger count, then to
/// the earlier candidate. `None` when no candidate is consistent.
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let mut end = text.len().min(SNIFF_SAMPLE_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &text[..end];

    let mut lines: Vec<&str> = sample.lines().collect();
    if end < text.len() && lines.len() > 1 {
        // The last line was cut by the sample boundary.
        lines.pop();
    }
    let lines: Vec<&str> = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, usize)> = None;
    for &candidate in CANDIDATE_DELIMITERS {
        let first = count_unquoted(lines[0], candidate as char);
        if first == 0 {
            continue;
        }
        let consistent = lines
            .iter()
            .all(|line| count_unquoted(line, candidate as char) == first);
        if consistent && best.map_or(true, |(_, count)| first > count) {
            best = Some((candidate, first));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read the whole file as UTF-8 with any BOM removed. Failures become batch
/// errors.
fn read_source(path: &Path, result: &mut ValidationResult) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            result.add_error(format!("CSV file not found: {}", path.display()));
            return None;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            result.add_error(format!("Permission denied accessing CSV file: {}", path.display()));
            return None;
        }
        Err(e) => {
            result.add_error(format!("Failed to read CSV file: {e}"));
            return None;
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => Some(match text.strip_prefix(UTF8_BOM) {
            Some(stripped) => stripped.to_string(),
            None => text,
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "CSV file is not valid UTF-8");
            result.add_error(format!("Encoding error reading CSV file: {e}"));
            None
        }
    }
}

fn detect_delimiter(text: &str, path: &Path) -> Option<u8> {
    let detected = sniff_delimiter(text);
    if detected.is_none() {
        tracing::warn!(path = %path.display(), "Could not detect CSV dialect, using comma");
    }
    detected
}

fn has_headers(headers: &StringRecord) -> bool {
    headers.iter().any(|h| !h.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Read `csv_path` into items.
///
/// `mapping` maps logical field names to CSV headers; `None` uses the
/// configuration's effective mappings. Data rows are numbered as lines of
/// the file, so the first data row is row 2.
pub fn ingest(
    csv_path: &Path,
    mapping: Option<&IndexMap<String, String>>,
    fields: &FieldsConfig,
) -> (Vec<Item>, ValidationResult) {
    let mut result = ValidationResult::new();
    let mut items = Vec::new();

    let configured;
    let mapping = match mapping {
        Some(mapping) => mapping,
        None => {
            configured = fields.effective_mappings();
            &configured
        }
    };

    let Some(text) = read_source(csv_path, &mut result) else {
        return (items, result);
    };
    let delimiter = detect_delimiter(&text, csv_path).unwrap_or(b',');

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) if has_headers(headers) => headers.clone(),
        Ok(_) => {
            result.add_error("CSV file has no headers");
            return (items, result);
        }
        Err(e) => {
            result.add_error(format!("Failed to read CSV file: {e}"));
            return (items, result);
        }
    };

    // Logical field -> header position; unmapped columns are ignored.
    let mut columns: Vec<(&str, usize)> = Vec::new();
    for (field, column) in mapping {
        match headers.iter().position(|h| h == column) {
            Some(position) => columns.push((field.as_str(), position)),
            None => result.add_warning(format!(
                "Field '{field}' maps to missing CSV column '{column}'"
            )),
        }
    }

    for (index, record) in reader.records().enumerate() {
        let fallback_row = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let row = e.position().map_or(fallback_row, |p| p.line() as usize);
                tracing::warn!(row, error = %e, "Skipping unreadable CSV row");
                result.add_error(format!("Error processing row {row}: {e}"));
                continue;
            }
        };
        let row = record.position().map_or(fallback_row, |p| p.line() as usize);

        if record.len() > headers.len() {
            result.add_error(format!(
                "Error processing row {row}: row has {} fields but the header has {}",
                record.len(),
                headers.len()
            ));
            continue;
        }

        let item = item_from_record(&record, &columns, fields);
        warn_missing_required(&item, fields, row, &mut result);
        items.push(item);
    }

    tracing::info!(path = %csv_path.display(), items = items.len(), "Loaded items from CSV");
    (items, result)
}

fn item_from_record(record: &StringRecord, columns: &[(&str, usize)], fields: &FieldsConfig) -> Item {
    let mut item = Item::default();
    for &(field, position) in columns {
        let raw = record.get(position).map(str::trim).unwrap_or_default();
        match field {
            "category" => item.category = raw.to_string(),
            "name" => item.name = raw.to_string(),
            "description" => item.description = raw.to_string(),
            // `id` is assigned on persist and never read from the source.
            "id" => {}
            custom => {
                item.custom_fields
                    .insert(custom.to_string(), coerce(raw, fields.field_type(custom)));
            }
        }
    }
    item
}

fn warn_missing_required(item: &Item, fields: &FieldsConfig, row: usize, result: &mut ValidationResult) {
    for required in &fields.required_fields {
        let present = match required.as_str() {
            "category" => !item.category.is_empty(),
            "name" => !item.name.is_empty(),
            "description" => !item.description.is_empty(),
            custom => item.custom_fields.get(custom).is_some_and(is_truthy_or_false),
        };
        if !present {
            result.add_warning(format!("Row {row}: Missing required field '{required}'"));
        }
    }
}

/// A coerced `false` is a real value, not a missing one.
fn is_truthy_or_false(value: &Value) -> bool {
    value.is_boolean() || is_truthy(value)
}

// ---------------------------------------------------------------------------
// Structure check
// ---------------------------------------------------------------------------

/// Inspect a CSV file's shape without building items.
///
/// Required columns come from `rules` and are resolved through the field
/// mappings.
pub fn validate_csv_structure(
    csv_path: &Path,
    rules: Option<&ValidationRuleSet>,
    fields: &FieldsConfig,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    let Some(text) = read_source(csv_path, &mut result) else {
        return result;
    };
    if text.is_empty() {
        result.add_error("CSV file is empty");
        return result;
    }

    let delimiter = match sniff_delimiter(&text) {
        Some(delimiter) => delimiter,
        None => {
            result.add_warning("Could not detect CSV dialect, using default");
            b','
        }
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = match reader.headers() {
        Ok(headers) if has_headers(headers) => headers.clone(),
        Ok(_) => {
            result.add_error("CSV file has no headers");
            return result;
        }
        Err(e) => {
            result.add_error(format!("Failed to validate CSV structure: {e}"));
            return result;
        }
    };

    if let Some(rules) = rules {
        for required in &rules.required_columns {
            let column = fields
                .field_mappings
                .get(required)
                .map(String::as_str)
                .unwrap_or(required);
            if !headers.iter().any(|h| h == column) {
                result.add_error(format!("Required column '{column}' not found in CSV"));
            }
        }
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for header in headers.iter() {
        if !seen.insert(header) && !duplicates.contains(&header) {
            duplicates.push(header);
        }
    }
    if !duplicates.is_empty() {
        result.add_error(format!(
            "Duplicate column headers found: {}",
            duplicates.join(", ")
        ));
    }

    let rows = reader.records().count();
    tracing::info!(
        path = %csv_path.display(),
        columns = headers.len(),
        rows,
        "CSV structure checked"
    );
    result
}
