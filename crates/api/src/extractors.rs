//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use foodgram_common::AppError;
use foodgram_core::RequestContext;
use foodgram_db::entities::user;
use serde::de::DeserializeOwned;

use crate::middleware::AppState;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 6;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by auth middleware)
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Request context: viewer, base URL and `recipes_limit`.
#[derive(Debug, Clone)]
pub struct Ctx(pub RequestContext);

impl FromRequestParts<AppState> for Ctx {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let viewer = parts.extensions.get::<user::Model>().cloned();
        let recipes_limit = query_param(parts, "recipes_limit");

        Ok(Self(
            RequestContext::anonymous(state.base_url.clone())
                .with_viewer(viewer)
                .with_recipes_limit(recipes_limit.as_deref()),
        ))
    }
}

/// Page-number pagination (`page`, `limit`).
#[derive(Debug, Clone)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Absolute URL of the current request, for `next`/`previous` links.
    pub url: String,
}

impl Pagination {
    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Offset of a 1-based page, if the database can skip that many rows.
fn page_offset(page: u64, limit: u64) -> Option<u64> {
    page.checked_sub(1)?
        .checked_mul(limit)
        .filter(|offset| i64::try_from(*offset).is_ok())
}

impl FromRequestParts<AppState> for Pagination {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let limit = query_param(parts, "limit")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|limit| *limit >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |limit| limit.min(MAX_PAGE_SIZE));

        let page = match query_param(parts, "page") {
            None => 1,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|page| page_offset(*page, limit).is_some())
                .ok_or_else(|| AppError::NotFound("Invalid page".to_string()))?,
        };

        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());

        Ok(Self {
            page,
            limit,
            url: format!("{}{path_and_query}", state.base_url),
        })
    }
}

/// JSON request body.
///
/// Unlike [`Json`], a body that does not fit the target type is rejected
/// with a 400: a field error when the failing field is known, otherwise a
/// plain bad request.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_error(&rejection)),
        }
    }
}

fn body_error(rejection: &JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            // The source carries the field path without axum's preamble
            let detail = std::error::Error::source(err)
                .map_or_else(|| err.body_text(), ToString::to_string);
            data_error(&detail)
        }
        _ => AppError::BadRequest(rejection.body_text()),
    }
}

/// Map `"<path>: <message> at line L column C"` to a field error.
fn data_error(detail: &str) -> AppError {
    let detail = detail
        .rfind(" at line ")
        .map_or(detail, |index| &detail[..index]);

    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(char::is_whitespace) => (path, message),
        _ => ("", detail),
    };
    let path = if path == "." { "" } else { path };

    if let Some(field) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
    {
        let field = if path.is_empty() {
            field.to_string()
        } else {
            format!("{path}.{field}")
        };
        return AppError::field(field, "This field is required.");
    }

    if path.is_empty() {
        AppError::BadRequest(message.to_string())
    } else {
        AppError::field(path, message)
    }
}

/// First value of a query-string parameter.
fn query_param(parts: &Parts, name: &str) -> Option<String> {
    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
