//! Handlers for configuration retrieval, validation and examples.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use indexmap::IndexMap;
use isdb_core::config::{CategorySet, ConfigManager, DocumentStatus, FieldsConfig, UiConfig};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppResult;
use crate::handlers::blocking;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CurrentConfig {
    pub categories: CategorySet,
    pub field_mappings: FieldsConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Serialize)]
pub struct ConfigValidation {
    pub is_valid: bool,
    pub details: IndexMap<&'static str, DocumentStatus>,
}

#[derive(Debug, Serialize)]
pub struct ExampleSummary {
    pub name: String,
    pub title: String,
    pub description: String,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct ExampleDocument {
    pub name: String,
    pub config: Value,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let manager = state.config_manager.clone();
    let config = blocking(move || {
        Ok(CurrentConfig {
            categories: manager.categories().value.clone(),
            field_mappings: manager.fields().value.clone(),
            ui: manager.ui().value.clone(),
        })
    })
    .await?;
    Ok(Json(DataResponse { data: config }))
}

/// GET /api/config/validate
///
/// Force-reloads every document.
pub async fn validate_config(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let manager = state.config_manager.clone();
    let details = blocking(move || Ok(manager.validate_documents())).await?;
    let is_valid = details.values().all(|status| status.valid);

    tracing::info!(is_valid, "Configuration validation completed");
    Ok(Json(DataResponse {
        data: ConfigValidation { is_valid, details },
    }))
}

/// GET /api/config/examples
pub async fn list_examples(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let manager = state.config_manager.clone();
    let examples = blocking(move || Ok(summarise_examples(&manager))).await?;
    Ok(Json(DataResponse { data: examples }))
}

/// GET /api/config/examples/{name}
pub async fn get_example(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let manager = state.config_manager.clone();
    let (name, config) = blocking(move || {
        let config = manager.load_example(&name)?;
        Ok((name, config))
    })
    .await?;
    Ok(Json(DataResponse {
        data: ExampleDocument { name, config },
    }))
}

fn summarise_examples(manager: &ConfigManager) -> Vec<ExampleSummary> {
    manager
        .list_examples()
        .into_iter()
        .map(|name| match manager.load_example(&name) {
            Ok(doc) => ExampleSummary {
                title: text_field(&doc, "title").unwrap_or_else(|| name.clone()),
                description: text_field(&doc, "description").unwrap_or_default(),
                available: true,
                name,
            },
            Err(e) => {
                tracing::warn!(example = %name, error = %e, "Unreadable example configuration");
                ExampleSummary {
                    title: name.clone(),
                    description: e.to_string(),
                    available: false,
                    name,
                }
            }
        })
        .collect()
}

fn text_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}
