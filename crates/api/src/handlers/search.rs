//! Handlers for the search page and the search endpoint.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use isdb_core::config::defaults;
use isdb_core::search::{parse_field_list, value_contains};
use isdb_db::models::item::{ItemRow, SearchRecord};
use isdb_db::repositories::SearchRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::blocking;
use crate::page;
use crate::state::AppState;

/// Query parameters for `GET /search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    /// Comma-separated field names to narrow the results by.
    #[serde(default)]
    pub fields: String,
}

/// GET /
///
/// The search page. Category counts that cannot be computed render as an
/// empty list rather than failing the page.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let manager = state.config_manager.clone();
    let loaded = blocking(move || Ok((manager.ui(), manager.categories()))).await;
    let (ui, categories) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load page configuration");
            return Html(page::render_index(&defaults::ui(), &defaults::categories(), &[]));
        }
    };

    let counts = match SearchRepo::category_counts(&state.pool, &categories).await {
        Ok(counts) => counts,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to get category counts");
            Vec::new()
        }
    };

    Html(page::render_index(&ui, &categories, &counts))
}

/// GET /search?q=&category=&fields=
///
/// A bare JSON array of item records. An empty `q` returns `[]`.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<SearchRecord>>> {
    if params.q.is_empty() {
        tracing::debug!("Empty query, returning no results");
        return Ok(Json(Vec::new()));
    }

    let manager = state.config_manager.clone();
    let categories = blocking(move || Ok(manager.categories())).await?;
    let rows = SearchRepo::search(&state.pool, &params.q, &params.category, &categories).await?;
    let mut records: Vec<SearchRecord> = rows.into_iter().map(ItemRow::into_record).collect();

    let fields = parse_field_list(&params.fields);
    if !fields.is_empty() {
        records.retain(|record| {
            fields.iter().any(|field| {
                record
                    .field(field)
                    .is_some_and(|value| value_contains(&value, &params.q))
            })
        });
    }

    tracing::info!(
        query = %params.q,
        category = %params.category,
        results = records.len(),
        "Search"
    );
    Ok(Json(records))
}
