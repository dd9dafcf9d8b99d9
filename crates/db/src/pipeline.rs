//! CSV-to-store loading: optional pre-load backup, ingestion, validation,
//! persistence, full-text rebuild. Steps run strictly in sequence.

use std::path::PathBuf;
use std::sync::Arc;

use isdb_core::backup::BackupManager;
use isdb_core::config::ConfigManager;
use isdb_core::ingest::ingest;
use isdb_core::item::{DataStats, Item};
use isdb_core::validation::{validate, ValidationResult, ValidationRuleSet};
use serde::Serialize;

use crate::repositories::ItemRepo;
use crate::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ingestion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub csv_path: PathBuf,
    /// Persisted validation rules; synthesised from configuration when
    /// `None` or unusable.
    pub rules_path: Option<PathBuf>,
    /// Leave the store untouched when the batch is invalid.
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub csv_path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub backup_error: Option<String>,
    pub items_read: usize,
    pub inserted: u64,
    pub skipped: usize,
    /// Whether the store contents were replaced.
    pub stored: bool,
    /// Ingestion and validation messages, in that order.
    pub result: ValidationResult,
    pub stats: DataStats,
}

struct Prepared {
    items: Vec<Item>,
    result: ValidationResult,
    backup_path: Option<PathBuf>,
    backup_error: Option<String>,
}

/// Load `options.csv_path` into the store.
///
/// Data problems end up in [`LoadReport::result`], never in `Err`. The store
/// is replaced unless ingestion produced no items alongside errors, or
/// `strict` is set and the batch is invalid.
pub async fn load_csv_into_store(
    pool: &DbPool,
    config: &ConfigManager,
    backups: Option<Arc<BackupManager>>,
    options: LoadOptions,
) -> Result<LoadReport, PipelineError> {
    let fields = config.fields();
    let categories = config.categories();

    let prepared = {
        let fields = Arc::clone(&fields);
        let categories = Arc::clone(&categories);
        let options = options.clone();
        tokio::task::spawn_blocking(move || {
            prepare(&options, backups.as_deref(), &fields.value, &categories.value)
        })
        .await?
    };

    let Prepared {
        items,
        result,
        backup_path,
        backup_error,
    } = prepared;
    let stats = DataStats::from_items(&items);

    let empty_failure = items.is_empty() && !result.errors.is_empty();
    let rejected = options.strict && !result.is_valid;

    let (inserted, skipped, stored) = if empty_failure || rejected {
        tracing::warn!(
            errors = result.errors.len(),
            strict = options.strict,
            "Batch not persisted"
        );
        (0, 0, false)
    } else {
        let outcome = ItemRepo::replace_all(pool, &items, &categories.value).await?;
        (outcome.inserted, outcome.skipped, true)
    };

    tracing::info!(
        csv = %options.csv_path.display(),
        items = items.len(),
        inserted,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "CSV load finished"
    );

    Ok(LoadReport {
        csv_path: options.csv_path,
        backup_path,
        backup_error,
        items_read: items.len(),
        inserted,
        skipped,
        stored,
        result,
        stats,
    })
}

fn prepare(
    options: &LoadOptions,
    backups: Option<&BackupManager>,
    fields: &isdb_core::config::FieldsConfig,
    categories: &isdb_core::config::CategorySet,
) -> Prepared {
    let mut result = ValidationResult::new();

    let (backup_path, backup_error) = match backups {
        Some(manager) if options.csv_path.exists() => {
            match manager.pre_update_backup(&options.csv_path, None) {
                Ok(path) => (Some(path), None),
                Err(e) => {
                    tracing::warn!(error = %e, "Pre-load backup failed");
                    (None, Some(e.to_string()))
                }
            }
        }
        _ => (None, None),
    };

    let (mut items, ingestion) = ingest(&options.csv_path, None, fields);
    result.merge(ingestion);

    let rules = match &options.rules_path {
        Some(path) => ValidationRuleSet::load_or_default(path, fields, categories),
        None => ValidationRuleSet::from_config(fields, categories),
    };
    if !items.is_empty() {
        let validation = validate(&mut items, Some(&rules), fields, categories);
        if validation.is_valid {
            tracing::info!(count = items.len(), "Validated items");
        }
        result.merge(validation);
    }

    Prepared {
        items,
        result,
        backup_path,
        backup_error,
    }
}
