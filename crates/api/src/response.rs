//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use url::Url;

use crate::extractors::Pagination;

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    /// Total number of items across all pages.
    pub count: u64,
    /// Absolute URL of the next page.
    pub next: Option<String>,
    /// Absolute URL of the previous page.
    pub previous: Option<String>,
    /// Items on this page.
    pub results: Vec<T>,
}

impl<T: Serialize> Page<T> {
    /// Wrap one page of results.
    #[must_use]
    pub fn new(results: Vec<T>, count: u64, pagination: &Pagination) -> Self {
        let next = (pagination.page * pagination.limit < count)
            .then(|| page_url(&pagination.url, pagination.page + 1))
            .flatten();
        let previous = (pagination.page > 1)
            .then(|| page_url(&pagination.url, pagination.page - 1))
            .flatten();

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `url` with its `page` parameter set to `page`; page 1 drops the parameter.
fn page_url(url: &str, page: u64) -> Option<String> {
    let mut url = Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    if !pairs.is_empty() || page > 1 {
        let mut query = url.query_pairs_mut();
        query.extend_pairs(pairs);
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }

    Some(url.into())
}

/// `201 Created` with a JSON body.
pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// Empty success response.
#[must_use]
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
