//! HTTP API layer for foodgram.
//!
//! - **Endpoints**: users, subscriptions, ingredients, recipes, short links
//! - **Extractors**: authentication, request context, pagination
//! - **Middleware**: token authentication, application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// The API mounted under `/api` with token authentication applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
