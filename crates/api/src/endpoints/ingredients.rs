//! Ingredient endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use foodgram_common::AppResult;
use foodgram_db::entities::ingredient;
use serde::Deserialize;

use crate::middleware::AppState;

/// Ingredient search parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

/// List ingredients, optionally filtered by name prefix.
async fn list(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<ingredient::Model>>> {
    Ok(Json(
        state
            .ingredient_service
            .search(params.name.as_deref())
            .await?,
    ))
}

/// Get an ingredient.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ingredient::Model>> {
    Ok(Json(state.ingredient_service.get(id).await?))
}

/// Ingredient routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list))
        .route("/ingredients/{id}/", get(show))
}
