//! User, avatar, password and subscription endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post, put},
};
use foodgram_common::AppResult;
use foodgram_core::{
    CreateUserInput, RelationKind, SetPasswordInput, SubscriptionView, UserCreatedView,
    UserView,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Ctx, JsonBody, Pagination},
    middleware::AppState,
    response::{Page, created, no_content},
};

/// Avatar upload request.
#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    /// Base64 data URI.
    pub avatar: String,
}

/// Avatar upload response.
#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    /// Public URL of the stored avatar.
    pub avatar: String,
}

/// List users.
async fn list(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    pagination: Pagination,
) -> AppResult<Page<UserView>> {
    let (users, count) = state
        .user_service
        .list(&ctx, pagination.offset(), pagination.limit)
        .await?;
    Ok(Page::new(users, count, &pagination))
}

/// Register a new user.
async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateUserInput>,
) -> AppResult<Response> {
    let user = state.user_service.register(input).await?;
    Ok(created(UserCreatedView::from(&user)))
}

/// Get a user profile.
async fn show(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path(id): Path<i32>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.user_service.profile(id, &ctx).await?))
}

/// Get the current user.
async fn me(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.user_service.me(&ctx).await?))
}

/// Upload an avatar.
async fn set_avatar(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
    JsonBody(req): JsonBody<AvatarRequest>,
) -> AppResult<Json<AvatarResponse>> {
    let avatar = state.user_service.set_avatar(&ctx, &req.avatar).await?;
    Ok(Json(AvatarResponse { avatar }))
}

/// Remove the avatar.
async fn delete_avatar(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
) -> AppResult<Response> {
    state.user_service.delete_avatar(&ctx).await?;
    Ok(no_content())
}

/// Change the password.
async fn set_password(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
    JsonBody(input): JsonBody<SetPasswordInput>,
) -> AppResult<Response> {
    state.user_service.set_password(&ctx, input).await?;
    Ok(no_content())
}

/// List followed authors with their recipes.
async fn subscriptions(
    State(state): State<AppState>,
    _user: AuthUser,
    Ctx(ctx): Ctx,
    pagination: Pagination,
) -> AppResult<Page<SubscriptionView>> {
    let (views, count) = state
        .subscription_service
        .list(&ctx, pagination.offset(), pagination.limit)
        .await?;
    Ok(Page::new(views, count, &pagination))
}

/// Follow an author.
async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Ctx(ctx): Ctx,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let author = state
        .relation_service
        .add(RelationKind::Subscription, user.id, id)
        .await?
        .into_author()?;

    let view = state.subscription_service.view(&author, &ctx).await?;
    Ok(created(view))
}

/// Unfollow an author.
async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    state
        .relation_service
        .remove(RelationKind::Subscription, user.id, id)
        .await?;
    Ok(no_content())
}

/// User routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list).post(register))
        .route("/users/me/", get(me))
        .route("/users/me/avatar/", put(set_avatar).delete(delete_avatar))
        .route("/users/set_password/", post(set_password))
        .route("/users/subscriptions/", get(subscriptions))
        .route("/users/{id}/", get(show))
        .route("/users/{id}/subscribe/", post(subscribe).delete(unsubscribe))
}
