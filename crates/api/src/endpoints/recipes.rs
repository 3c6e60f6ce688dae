//! Recipe, favorite, shopping cart and short-link endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use foodgram_common::AppResult;
use foodgram_core::{
    CreateRecipeInput, RecipeListQuery, RecipeShortView, RecipeView, RelationKind,
    UpdateRecipeInput,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Ctx, JsonBody, Pagination},
    middleware::AppState,
    response::{Page, created, no_content},
};

/// Raw recipe list filters. Unparsable values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListParams {
    /// Author ID.
    pub author: Option<String>,
    /// Favorited by the viewer.
    pub is_favorited: Option<String>,
    /// In the viewer's shopping cart.
    pub is_in_shopping_cart: Option<String>,
}

impl RecipeListParams {
    fn into_query(self) -> RecipeListQuery {
        RecipeListQuery {
            author: self.author.and_then(|raw| raw.parse().ok()),
            is_favorited: self.is_favorited.as_deref().and_then(parse_flag),
            is_in_shopping_cart: self.is_in_shopping_cart.as_deref().and_then(parse_flag),
        }
    }
}

/// `1`/`0`, also accepting `true`/`false`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Short link response.
#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    /// Absolute short URL.
    #[serde(rename = "short-link")]
    pub short_link: String,
}

/// List recipes.
async fn list(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    pagination: Pagination,
    Query(params): Query<RecipeListParams>,
) -> AppResult<Page<RecipeView>> {
    let (recipes, count) = state
        .recipe_service
        .list(
            &params.into_query(),
            &ctx,
            pagination.offset(),
            pagination.limit,
        )
        .await?;
    Ok(Page::new(recipes, count, &pagination))
}

/// Publish a recipe.
async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
    JsonBody(input): JsonBody<CreateRecipeInput>,
) -> AppResult<Response> {
    let recipe = state.recipe_service.create(&ctx, input).await?;
    Ok(created(recipe))
}

/// Get a recipe.
async fn show(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path(id): Path<i32>,
) -> AppResult<Json<RecipeView>> {
    Ok(Json(state.recipe_service.get(id, &ctx).await?))
}

/// Partially update a recipe.
async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
    Path(id): Path<i32>,
    JsonBody(input): JsonBody<UpdateRecipeInput>,
) -> AppResult<Json<RecipeView>> {
    Ok(Json(state.recipe_service.update(&ctx, id, input).await?))
}

/// Delete a recipe.
async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    state.recipe_service.delete(&ctx, id).await?;
    Ok(no_content())
}

/// Get the short link of a recipe.
async fn get_link(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path(id): Path<i32>,
) -> AppResult<Json<ShortLinkResponse>> {
    let short_link = state.short_link_service.link_for(id, &ctx.base_url).await?;
    Ok(Json(ShortLinkResponse { short_link }))
}

async fn add_mark(
    state: &AppState,
    kind: RelationKind,
    owner_id: i32,
    id: i32,
) -> AppResult<Response> {
    let recipe = state
        .relation_service
        .add(kind, owner_id, id)
        .await?
        .into_recipe()?;
    Ok(created(RecipeShortView::from(&recipe)))
}

async fn remove_mark(
    state: &AppState,
    kind: RelationKind,
    owner_id: i32,
    id: i32,
) -> AppResult<Response> {
    state.relation_service.remove(kind, owner_id, id).await?;
    Ok(no_content())
}

/// Add a recipe to favorites.
async fn favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    add_mark(&state, RelationKind::Favorite, user.id, id).await
}

/// Remove a recipe from favorites.
async fn unfavorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    remove_mark(&state, RelationKind::Favorite, user.id, id).await
}

/// Add a recipe to the shopping cart.
async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    add_mark(&state, RelationKind::ShoppingCart, user.id, id).await
}

/// Remove a recipe from the shopping cart.
async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    remove_mark(&state, RelationKind::ShoppingCart, user.id, id).await
}

/// Download the aggregated shopping list as a text file.
async fn download_shopping_cart(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
) -> AppResult<Response> {
    let body = state.shopping_cart_service.download(&ctx).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        body,
    )
        .into_response())
}

/// Recipe routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list).post(create))
        .route(
            "/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route("/recipes/{id}/", get(show).patch(update).delete(delete))
        .route("/recipes/{id}/get-link/", get(get_link))
        .route("/recipes/{id}/favorite/", post(favorite).delete(unfavorite))
        .route(
            "/recipes/{id}/shopping_cart/",
            post(add_to_cart).delete(remove_from_cart),
        )
}
