//! Short links to recipes.
//!
//! A token is the lowercase hexadecimal rendering of the recipe ID. Tokens are
//! reversible and unnamespaced; they are a convenience, not an access control.

use foodgram_common::AppResult;
use foodgram_db::repositories::RecipeRepository;

/// Redirect target for tokens that do not name a recipe.
pub const NOT_FOUND_PATH: &str = "/404";

/// Encode a recipe ID as a token (`255` → `ff`).
#[must_use]
pub fn encode(id: i32) -> String {
    format!("{id:x}")
}

/// Decode a token. Invalid digits, empty input, signs and overflow yield `None`.
#[must_use]
pub fn decode(token: &str) -> Option<i32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    i32::from_str_radix(token, 16).ok()
}

/// Resolves short-link tokens and builds links.
#[derive(Clone)]
pub struct ShortLinkService {
    recipe_repo: RecipeRepository,
}

impl ShortLinkService {
    /// Create a new short link service.
    #[must_use]
    pub const fn new(recipe_repo: RecipeRepository) -> Self {
        Self { recipe_repo }
    }

    /// Redirect target for a token: the recipe page, or [`NOT_FOUND_PATH`].
    ///
    /// Never fails; lookup errors degrade to the not-found target.
    pub async fn resolve(&self, token: &str) -> String {
        let Some(id) = decode(token) else {
            tracing::warn!(token = %token, "Malformed short link");
            return NOT_FOUND_PATH.to_string();
        };

        match self.recipe_repo.find_by_id(id).await {
            Ok(Some(recipe)) => format!("/recipes/{}/", recipe.id),
            Ok(None) => {
                tracing::warn!(token = %token, recipe_id = id, "Short link to missing recipe");
                NOT_FOUND_PATH.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, token = %token, "Short link lookup failed");
                NOT_FOUND_PATH.to_string()
            }
        }
    }

    /// Absolute short link for an existing recipe.
    pub async fn link_for(&self, recipe_id: i32, base_url: &str) -> AppResult<String> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;
        Ok(format!(
            "{}/api/rec/{}/",
            base_url.trim_end_matches('/'),
            encode(recipe.id)
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_common::AppError;
    use foodgram_db::entities::recipe;
    use foodgram_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_encode() {
        assert_eq!(encode(255), "ff");
        assert_eq!(encode(1), "1");
        assert_eq!(encode(4096), "1000");
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("ff"), Some(255));
        assert_eq!(decode("FF"), Some(255));
        assert_eq!(decode(&encode(123_456)), Some(123_456));
        assert_eq!(decode("zz"), None);
        assert_eq!(decode(""), None);
        assert_eq!(decode("-1"), None);
        assert_eq!(decode("+1"), None);
        assert_eq!(decode("ffffffffff"), None);
    }

    #[tokio::test]
    async fn test_resolve_existing_recipe() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::recipe(255, 1)]])
                .into_connection(),
        );
        let service = ShortLinkService::new(RecipeRepository::new(db));

        assert_eq!(service.resolve("ff").await, "/recipes/255/");
    }

    #[tokio::test]
    async fn test_resolve_unknown_targets_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );
        let service = ShortLinkService::new(RecipeRepository::new(db));

        assert_eq!(service.resolve("zz").await, NOT_FOUND_PATH);
        assert_eq!(service.resolve("7b").await, NOT_FOUND_PATH);
    }

    #[tokio::test]
    async fn test_link_for() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::recipe(255, 1)]])
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );
        let service = ShortLinkService::new(RecipeRepository::new(db));

        assert_eq!(
            service.link_for(255, "https://foodgram.example/").await.unwrap(),
            "https://foodgram.example/api/rec/ff/"
        );
        assert!(matches!(
            service.link_for(3, "https://foodgram.example").await,
            Err(AppError::RecipeNotFound(_))
        ));
    }
}
