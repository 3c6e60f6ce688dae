//! Request-scoped context handed to services.

use foodgram_common::{AppError, AppResult};
use foodgram_db::entities::user;

/// Who is asking and with which request-wide options.
///
/// Built once per request by the API layer and passed explicitly to every
/// service call that renders viewer-dependent data.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Authenticated user, `None` for anonymous requests.
    pub viewer: Option<user::Model>,
    /// Public base URL without a trailing slash.
    pub base_url: String,
    /// Truncation for embedded recipe lists in subscription views.
    pub recipes_limit: Option<u64>,
}

impl RequestContext {
    /// Context for an anonymous request.
    #[must_use]
    pub fn anonymous(base_url: impl Into<String>) -> Self {
        Self {
            viewer: None,
            base_url: base_url.into(),
            recipes_limit: None,
        }
    }

    /// Attach a viewer.
    #[must_use]
    pub fn with_viewer(mut self, viewer: Option<user::Model>) -> Self {
        self.viewer = viewer;
        self
    }

    /// Attach a raw `recipes_limit` query value.
    #[must_use]
    pub fn with_recipes_limit(mut self, raw: Option<&str>) -> Self {
        self.recipes_limit = parse_recipes_limit(raw);
        self
    }

    /// ID of the viewer, if any.
    #[must_use]
    pub fn viewer_id(&self) -> Option<i32> {
        self.viewer.as_ref().map(|v| v.id)
    }

    /// The viewer, or `Unauthorized` for anonymous requests.
    pub fn require_viewer(&self) -> AppResult<&user::Model> {
        self.viewer.as_ref().ok_or(AppError::Unauthorized)
    }
}

/// A non-negative integer limits the list; anything else is ignored.
fn parse_recipes_limit(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_db::test_utils::fixtures;

    #[test]
    fn test_recipes_limit_parsing() {
        assert_eq!(parse_recipes_limit(Some("3")), Some(3));
        assert_eq!(parse_recipes_limit(Some("0")), Some(0));
        assert_eq!(parse_recipes_limit(Some("-1")), None);
        assert_eq!(parse_recipes_limit(Some("abc")), None);
        assert_eq!(parse_recipes_limit(None), None);
    }

    #[test]
    fn test_require_viewer() {
        let ctx = RequestContext::anonymous("http://localhost");
        assert!(matches!(ctx.require_viewer(), Err(AppError::Unauthorized)));
        assert_eq!(ctx.viewer_id(), None);

        let ctx = ctx.with_viewer(Some(fixtures::user(4, "dave")));
        assert_eq!(ctx.require_viewer().unwrap().username, "dave");
        assert_eq!(ctx.viewer_id(), Some(4));
    }
}
