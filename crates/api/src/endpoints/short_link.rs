//! Short link redirects.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::middleware::AppState;

/// Redirect a short link to its recipe page, or to the not-found page.
async fn resolve(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let target = state.short_link_service.resolve(&token).await;
    (StatusCode::FOUND, [(header::LOCATION, target)]).into_response()
}

/// Short link routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/rec/{short_id}/", get(resolve))
}
