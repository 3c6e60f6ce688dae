//! API endpoints.

mod ingredients;
mod recipes;
mod short_link;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// All API routes, to be nested under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(ingredients::router())
        .merge(recipes::router())
        .merge(short_link::router())
}
