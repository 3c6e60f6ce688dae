//! Subscription listings.

use foodgram_common::AppResult;
use foodgram_db::{
    entities::user,
    repositories::{FollowRepository, RecipeRepository},
};

use crate::services::context::RequestContext;
use crate::services::views::{RecipeShortView, SubscriptionView, UserView};

/// Builds the viewer's subscription views.
#[derive(Clone)]
pub struct SubscriptionService {
    follow_repo: FollowRepository,
    recipe_repo: RecipeRepository,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            follow_repo,
            recipe_repo,
        }
    }

    /// View of an author the viewer follows, with recipes truncated to
    /// `ctx.recipes_limit`.
    pub async fn view(
        &self,
        author: &user::Model,
        ctx: &RequestContext,
    ) -> AppResult<SubscriptionView> {
        let recipes = self
            .recipe_repo
            .find_by_author(author.id, ctx.recipes_limit)
            .await?;
        let recipes_count = self.recipe_repo.count_by_author(author.id).await?;

        Ok(SubscriptionView {
            user: UserView::new(author, true),
            recipes: recipes.iter().map(RecipeShortView::from).collect(),
            recipes_count,
        })
    }

    /// Authors the viewer follows (paginated), with the total count.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<SubscriptionView>, u64)> {
        let viewer = ctx.require_viewer()?;

        let authors = self.follow_repo.find_authors(viewer.id, offset, limit).await?;
        let count = self.follow_repo.count_authors(viewer.id).await?;

        let mut views = Vec::with_capacity(authors.len());
        for author in &authors {
            views.push(self.view(author, ctx).await?);
        }

        Ok((views, count))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_common::AppError;
    use foodgram_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_view_truncates_recipes() {
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::recipe(5, 2), fixtures::recipe(4, 2)]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(5))
                }]])
                .into_connection(),
        );
        let follow_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = SubscriptionService::new(
            FollowRepository::new(follow_db),
            RecipeRepository::new(recipe_db),
        );

        let ctx = RequestContext::anonymous("http://localhost")
            .with_viewer(Some(fixtures::user(1, "ann")))
            .with_recipes_limit(Some("2"));
        let view = service.view(&fixtures::user(2, "bob"), &ctx).await.unwrap();

        assert!(view.user.is_subscribed);
        assert_eq!(view.recipes.len(), 2);
        assert_eq!(view.recipes[0].id, 5);
        assert_eq!(view.recipes_count, 5);
    }

    #[tokio::test]
    async fn test_list_requires_viewer() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = SubscriptionService::new(
            FollowRepository::new(db.clone()),
            RecipeRepository::new(db),
        );

        let ctx = RequestContext::anonymous("http://localhost");
        assert!(matches!(
            service.list(&ctx, 0, 6).await,
            Err(AppError::Unauthorized)
        ));
    }
}
