use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use jsonschema::{Draft, JSONSchema};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::defaults;
use super::model::{
    is_hex_color, CategoryConfig, CategorySet, FieldsConfig, UiConfig, UiDocument,
    FALLBACK_CATEGORY_COLOR,
};
use super::ConfigKind;
use crate::error::CoreError;

/// Example document names are plain identifiers so they cannot escape
/// the examples directory.
static EXAMPLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

/// Where a loaded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    File,
    Default,
}

/// A parsed document together with the diagnostics of the load that
/// produced it.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub source: ConfigSource,
    pub issues: Vec<String>,
}

impl<T> Loaded<T> {
    /// A document read from disk with no recorded problems.
    pub fn is_clean(&self) -> bool {
        self.source == ConfigSource::File && self.issues.is_empty()
    }
}

impl<T> Deref for Loaded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Per-document outcome of [`ConfigManager::validate_all`].
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStatus {
    pub valid: bool,
    pub source: ConfigSource,
    pub issues: Vec<String>,
}

#[derive(Default)]
struct Cache {
    categories: Option<Arc<Loaded<CategorySet>>>,
    fields: Option<Arc<Loaded<FieldsConfig>>>,
    ui: Option<Arc<Loaded<UiConfig>>>,
}

/// Raw JSON stage of a load, before typed conversion.
struct RawDocument {
    value: Option<Value>,
    issues: Vec<String>,
}

/// Loads and caches the configuration documents of one directory.
///
/// The cache lock is held across read-and-maybe-reload, and entries are
/// swapped in as complete `Arc`s, so a reader sees either the old or the
/// new document and never a partial one.
pub struct ConfigManager {
    config_dir: PathBuf,
    cache: Mutex<Cache>,
}

impl ConfigManager {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            cache: Mutex::new(Cache::default()),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.config_dir.join("schemas")
    }

    pub fn examples_dir(&self) -> PathBuf {
        self.config_dir.join("examples")
    }

    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Cached accessors
    // -----------------------------------------------------------------------

    pub fn categories(&self) -> Arc<Loaded<CategorySet>> {
        self.load_categories(false)
    }

    pub fn fields(&self) -> Arc<Loaded<FieldsConfig>> {
        self.load_fields(false)
    }

    pub fn ui(&self) -> Arc<Loaded<UiConfig>> {
        self.load_ui(false)
    }

    pub fn load_categories(&self, force_reload: bool) -> Arc<Loaded<CategorySet>> {
        let mut cache = self.lock();
        cached(&mut cache.categories, force_reload, || self.read_categories())
    }

    pub fn load_fields(&self, force_reload: bool) -> Arc<Loaded<FieldsConfig>> {
        let mut cache = self.lock();
        cached(&mut cache.fields, force_reload, || self.read_fields())
    }

    pub fn load_ui(&self, force_reload: bool) -> Arc<Loaded<UiConfig>> {
        let mut cache = self.lock();
        cached(&mut cache.ui, force_reload, || self.read_ui())
    }

    /// Issues recorded by the most recent load of `kind`.
    pub fn diagnostics(&self, kind: ConfigKind) -> Vec<String> {
        match kind {
            ConfigKind::Categories => self.categories().issues.clone(),
            ConfigKind::Fields => self.fields().issues.clone(),
            ConfigKind::Ui => self.ui().issues.clone(),
        }
    }

    pub fn clear_cache(&self) {
        *self.lock() = Cache::default();
        tracing::debug!(dir = %self.config_dir.display(), "Configuration cache cleared");
    }

    /// Force-reload every document and report per-document status.
    pub fn validate_documents(&self) -> IndexMap<&'static str, DocumentStatus> {
        fn status<T>(loaded: &Loaded<T>) -> DocumentStatus {
            DocumentStatus {
                valid: loaded.is_clean(),
                source: loaded.source,
                issues: loaded.issues.clone(),
            }
        }

        let mut report = IndexMap::new();
        report.insert(ConfigKind::Categories.as_str(), status(&self.load_categories(true)));
        report.insert(ConfigKind::Fields.as_str(), status(&self.load_fields(true)));
        report.insert(ConfigKind::Ui.as_str(), status(&self.load_ui(true)));
        report
    }

    /// Whether every document reloads cleanly from its file.
    pub fn validate_all(&self) -> bool {
        self.validate_documents().values().all(|s| s.valid)
    }

    // -----------------------------------------------------------------------
    // Examples
    // -----------------------------------------------------------------------

    /// Names (without `.json`) of the example documents, sorted.
    pub fn list_examples(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.examples_dir()) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|name| EXAMPLE_NAME_RE.is_match(name))
            .collect();
        names.sort();
        names
    }

    pub fn load_example(&self, name: &str) -> Result<Value, CoreError> {
        if !EXAMPLE_NAME_RE.is_match(name) {
            return Err(CoreError::Validation(format!(
                "Invalid example name '{name}'"
            )));
        }

        let path = self.examples_dir().join(format!("{name}.json"));
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CoreError::NotFound {
                entity: "ConfigExample",
                id: name.to_string(),
            },
            _ => CoreError::io(&path, e),
        })?;

        serde_json::from_str(&text).map_err(|e| {
            CoreError::Validation(format!("Example '{name}' is not valid JSON: {e}"))
        })
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    fn read_categories(&self) -> Loaded<CategorySet> {
        let raw = self.read_document(ConfigKind::Categories);
        let mut issues = raw.issues;

        let Some(value) = raw.value else {
            return fallback(defaults::categories(), issues);
        };
        let Some(entries) = value.get("categories").and_then(Value::as_object) else {
            issues.push("categories document has no 'categories' object, using defaults".into());
            return fallback(defaults::categories(), issues);
        };

        let mut set = CategorySet::new();
        for (key, entry) in entries {
            let mut config: CategoryConfig = match serde_json::from_value(entry.clone()) {
                Ok(c) => c,
                Err(e) => {
                    let issue = format!("Skipping category '{key}': {e}");
                    tracing::warn!(category = %key, error = %e, "Skipping malformed category");
                    issues.push(issue);
                    continue;
                }
            };
            if !is_hex_color(&config.color) {
                issues.push(format!(
                    "Category '{key}' has invalid color '{}', using {FALLBACK_CATEGORY_COLOR}",
                    config.color
                ));
                config.color = FALLBACK_CATEGORY_COLOR.to_string();
            }
            set.insert(key.clone(), config);
        }

        tracing::debug!(count = set.len(), "Loaded categories configuration");
        Loaded {
            value: set,
            source: ConfigSource::File,
            issues,
        }
    }

    fn read_fields(&self) -> Loaded<FieldsConfig> {
        let raw = self.read_document(ConfigKind::Fields);
        let mut issues = raw.issues;

        let Some(value) = raw.value else {
            return fallback(defaults::fields(), issues);
        };
        match serde_json::from_value::<FieldsConfig>(value) {
            Ok(fields) => Loaded {
                value: fields,
                source: ConfigSource::File,
                issues,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Fields configuration has an unexpected shape");
                issues.push(format!("fields document has an unexpected shape: {e}"));
                fallback(defaults::fields(), issues)
            }
        }
    }

    fn read_ui(&self) -> Loaded<UiConfig> {
        let raw = self.read_document(ConfigKind::Ui);
        let mut issues = raw.issues;

        let Some(value) = raw.value else {
            return fallback(defaults::ui(), issues);
        };
        match serde_json::from_value::<UiDocument>(value) {
            Ok(doc) => Loaded {
                value: doc.ui,
                source: ConfigSource::File,
                issues,
            },
            Err(e) => {
                tracing::warn!(error = %e, "UI configuration has an unexpected shape");
                issues.push(format!("ui document has an unexpected shape: {e}"));
                fallback(defaults::ui(), issues)
            }
        }
    }

    /// Read, parse and schema-check one document. `value` is `None` when
    /// the caller must fall back to the default.
    fn read_document(&self, kind: ConfigKind) -> RawDocument {
        let path = self.config_dir.join(kind.file_name());
        let mut issues = Vec::new();

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Configuration file not found, using defaults");
                issues.push(format!("{} not found, using defaults", path.display()));
                self.materialize_default(kind, &path);
                return RawDocument { value: None, issues };
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read configuration file");
                issues.push(format!("Failed to read {}: {e}", path.display()));
                return RawDocument { value: None, issues };
            }
        };

        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Malformed configuration file, using defaults");
                issues.push(format!("Invalid JSON in {}: {e}", path.display()));
                return RawDocument { value: None, issues };
            }
        };

        let schema_errors = self.schema_errors(kind, &value);
        if !schema_errors.is_empty() {
            tracing::warn!(
                kind = %kind,
                errors = schema_errors.len(),
                "Configuration failed schema validation, using defaults"
            );
            issues.extend(
                schema_errors
                    .into_iter()
                    .map(|e| format!("{kind} schema violation: {e}")),
            );
            return RawDocument { value: None, issues };
        }

        RawDocument {
            value: Some(value),
            issues,
        }
    }

    /// Schema violations of `value`. A schema that is absent, unreadable,
    /// or does not compile yields no violations.
    fn schema_errors(&self, kind: ConfigKind, value: &Value) -> Vec<String> {
        let path = self.schemas_dir().join(kind.schema_file_name());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Unreadable schema, skipping validation");
                }
                return Vec::new();
            }
        };
        let schema: Value = match serde_json::from_str(&text) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Malformed schema, skipping validation");
                return Vec::new();
            }
        };

        let compiled = match JSONSchema::options().with_draft(Draft::Draft7).compile(&schema) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Schema does not compile, skipping validation");
                return Vec::new();
            }
        };

        let errors: Vec<String> = match compiled.validate(value) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| format!("{} at '{}'", e, e.instance_path))
                .collect(),
        };
        errors
    }

    /// Write the default document so operators have a file to edit.
    fn materialize_default(&self, kind: ConfigKind, path: &Path) {
        let result = fs::create_dir_all(&self.config_dir).and_then(|()| {
            let text = serde_json::to_string_pretty(&kind.default_document())
                .map_err(io::Error::other)?;
            fs::write(path, text)
        });
        match result {
            Ok(()) => tracing::info!(path = %path.display(), "Wrote default configuration"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not write default configuration")
            }
        }
    }
}

fn cached<T>(
    slot: &mut Option<Arc<Loaded<T>>>,
    force_reload: bool,
    load: impl FnOnce() -> Loaded<T>,
) -> Arc<Loaded<T>> {
    if !force_reload {
        if let Some(hit) = slot {
            return Arc::clone(hit);
        }
    }
    let loaded = Arc::new(load());
    *slot = Some(Arc::clone(&loaded));
    loaded
}

fn fallback<T>(value: T, issues: Vec<String>) -> Loaded<T> {
    Loaded {
        value,
        source: ConfigSource::Default,
        issues,
    }
}
