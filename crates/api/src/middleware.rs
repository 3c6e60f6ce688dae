//! API middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use foodgram_common::{Config, StorageBackend};
use foodgram_core::{
    ImageService, IngredientService, RecipeService, RelationService, ShoppingCartService,
    ShortLinkService, SubscriptionService, UserService,
};
use foodgram_db::repositories::{
    FollowRepository, IngredientRepository, RecipeMarkRepository, RecipeRepository,
    UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Users and profiles.
    pub user_service: UserService,
    /// Subscription listings.
    pub subscription_service: SubscriptionService,
    /// Ingredient catalogue.
    pub ingredient_service: IngredientService,
    /// Recipes.
    pub recipe_service: RecipeService,
    /// Favorite, cart and subscription toggles.
    pub relation_service: RelationService,
    /// Shopping list download.
    pub shopping_cart_service: ShoppingCartService,
    /// Short links.
    pub short_link_service: ShortLinkService,
    /// Public base URL without a trailing slash.
    pub base_url: String,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: &Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(db));
        let follow_repo = FollowRepository::new(Arc::clone(db));
        let ingredient_repo = IngredientRepository::new(Arc::clone(db));
        let recipe_repo = RecipeRepository::new(Arc::clone(db));
        let mark_repo = RecipeMarkRepository::new(Arc::clone(db));

        let images = ImageService::new(storage);

        Self {
            user_service: UserService::new(user_repo.clone(), follow_repo.clone(), images.clone()),
            subscription_service: SubscriptionService::new(
                follow_repo.clone(),
                recipe_repo.clone(),
            ),
            ingredient_service: IngredientService::new(ingredient_repo.clone()),
            recipe_service: RecipeService::new(
                recipe_repo.clone(),
                ingredient_repo,
                user_repo.clone(),
                follow_repo.clone(),
                mark_repo.clone(),
                images,
            ),
            relation_service: RelationService::new(
                user_repo,
                recipe_repo.clone(),
                follow_repo,
                mark_repo.clone(),
            ),
            shopping_cart_service: ShoppingCartService::new(mark_repo, recipe_repo.clone()),
            short_link_service: ShortLinkService::new(recipe_repo),
            base_url: config.base_url().to_string(),
        }
    }
}

/// Authentication middleware.
///
/// Accepts `Authorization: Token <key>` (and `Bearer <key>`). Unknown tokens
/// leave the request anonymous; endpoints that need a user reject it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str
            .strip_prefix("Token ")
            .or_else(|| auth_str.strip_prefix("Bearer "))
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Token authentication failed"),
        }
    }

    next.run(req).await
}
