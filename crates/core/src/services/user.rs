//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use foodgram_common::{AppError, AppResult, FieldErrors};
use foodgram_db::{
    entities::user,
    repositories::{FollowRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::context::RequestContext;
use crate::services::image::ImageService;
use crate::services::views::UserView;

/// Storage directory for avatars.
const AVATAR_DIR: &str = "avatars";

/// Input for registering a new user.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateUserInput {
    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 1, max = 150))]
    pub first_name: String,

    #[validate(length(min = 1, max = 150))]
    pub last_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for changing the viewer's password.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SetPasswordInput {
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,

    pub current_password: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    images: ImageService,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        follow_repo: FollowRepository,
        images: ImageService,
    ) -> Self {
        Self {
            user_repo,
            follow_repo,
            images,
        }
    }

    /// Register a new user.
    pub async fn register(&self, input: CreateUserInput) -> AppResult<user::Model> {
        let mut errors = input
            .validate()
            .err()
            .map(FieldErrors::from)
            .unwrap_or_default();

        if !input.username.is_empty() && !is_valid_username(&input.username) {
            errors.add(
                "username",
                "Enter a valid username. It may contain only letters, digits and @/./+/-/_ characters.",
            );
        }
        if errors.is_empty() {
            if self.user_repo.find_by_email(&input.email).await?.is_some() {
                errors.add("email", "A user with that email already exists.");
            }
            if self
                .user_repo
                .find_by_username(&input.username)
                .await?
                .is_some()
            {
                errors.add("username", "A user with that username already exists.");
            }
        }
        errors.into_result()?;

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            email: Set(input.email),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            password: Set(password_hash),
            avatar: Set(None),
            token: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: i32) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Authenticate a user by API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Profile of `user` as seen by the viewer.
    pub async fn view(&self, user: &user::Model, ctx: &RequestContext) -> AppResult<UserView> {
        let is_subscribed = match ctx.viewer_id() {
            Some(viewer_id) if viewer_id != user.id => {
                self.follow_repo.is_following(viewer_id, user.id).await?
            }
            _ => false,
        };
        Ok(UserView::new(user, is_subscribed))
    }

    /// Profiles of several users, with one follow lookup for the batch.
    pub async fn views(
        &self,
        users: &[user::Model],
        ctx: &RequestContext,
    ) -> AppResult<Vec<UserView>> {
        let followed = match ctx.viewer_id() {
            Some(viewer_id) => {
                let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
                self.follow_repo.followed_among(viewer_id, &ids).await?
            }
            None => vec![],
        };

        Ok(users
            .iter()
            .map(|u| UserView::new(u, followed.contains(&u.id)))
            .collect())
    }

    /// Profile by ID.
    pub async fn profile(&self, id: i32, ctx: &RequestContext) -> AppResult<UserView> {
        let user = self.user_repo.get_by_id(id).await?;
        self.view(&user, ctx).await
    }

    /// The viewer's own profile.
    pub async fn me(&self, ctx: &RequestContext) -> AppResult<UserView> {
        let viewer = ctx.require_viewer()?;
        Ok(UserView::new(viewer, false))
    }

    /// All users by ID (paginated), with the total count.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<UserView>, u64)> {
        let users = self.user_repo.list(offset, limit).await?;
        let count = self.user_repo.count().await?;
        Ok((self.views(&users, ctx).await?, count))
    }

    /// Replace the viewer's avatar with a data-URI image. Returns the new URL.
    pub async fn set_avatar(&self, ctx: &RequestContext, data_uri: &str) -> AppResult<String> {
        let viewer = ctx.require_viewer()?;
        let previous = viewer.avatar.clone();

        let url = self.images.store(AVATAR_DIR, "avatar", data_uri).await?;

        let mut active: user::ActiveModel = viewer.clone().into();
        active.avatar = Set(Some(url.clone()));
        if let Err(e) = self.user_repo.update(active).await {
            self.images.remove(&url).await;
            return Err(e);
        }

        if let Some(previous) = previous {
            self.images.remove(&previous).await;
        }

        tracing::info!(user_id = viewer.id, "Updated avatar");
        Ok(url)
    }

    /// Remove the viewer's avatar.
    pub async fn delete_avatar(&self, ctx: &RequestContext) -> AppResult<()> {
        let viewer = ctx.require_viewer()?;
        let Some(previous) = viewer.avatar.clone() else {
            return Ok(());
        };

        let mut active: user::ActiveModel = viewer.clone().into();
        active.avatar = Set(None);
        self.user_repo.update(active).await?;
        self.images.remove(&previous).await;

        tracing::info!(user_id = viewer.id, "Removed avatar");
        Ok(())
    }

    /// Change the viewer's password after checking the current one.
    pub async fn set_password(
        &self,
        ctx: &RequestContext,
        input: SetPasswordInput,
    ) -> AppResult<()> {
        let viewer = ctx.require_viewer()?;
        input.validate()?;

        if !verify_password(&input.current_password, &viewer.password)? {
            return Err(AppError::field("current_password", "Wrong password."));
        }

        let mut active: user::ActiveModel = viewer.clone().into();
        active.password = Set(hash_password(&input.new_password)?);
        self.user_repo.update(active).await?;

        tracing::info!(user_id = viewer.id, "Changed password");
        Ok(())
    }
}

/// Letters, digits and `@.+-_`.
fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::image::tests::temp_images;
    use foodgram_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(user_db: MockDatabase, follow_db: MockDatabase) -> UserService {
        UserService::new(
            UserRepository::new(Arc::new(user_db.into_connection())),
            FollowRepository::new(Arc::new(follow_db.into_connection())),
            temp_images(),
        )
    }

    fn input(username: &str) -> CreateUserInput {
        CreateUserInput {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            password: "correct horse".to_string(),
        }
    }

    fn ctx_for(viewer: Option<user::Model>) -> RequestContext {
        RequestContext::anonymous("http://localhost").with_viewer(viewer)
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("test", "invalid_hash").is_err());
    }

    #[test]
    fn test_username_pattern() {
        assert!(is_valid_username("alice.b+c@d-e_f"));
        assert!(is_valid_username("повар"));
        assert!(!is_valid_username("bad name"));
        assert!(!is_valid_username("semi;colon"));
    }

    #[tokio::test]
    async fn test_register() {
        let created = fixtures::user(1, "ann");
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created]]);
        let service = service(user_db, MockDatabase::new(DatabaseBackend::Postgres));

        let user = service.register(input("ann")).await.unwrap();
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_register_reports_taken_fields() {
        let existing = fixtures::user(1, "ann");
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]])
            .append_query_results([[existing]]);
        let service = service(user_db, MockDatabase::new(DatabaseBackend::Postgres));

        match service.register(input("ann")).await {
            Err(AppError::Validation(fields)) => {
                assert!(fields.get("email").is_some());
                assert!(fields.get("username").is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input_without_queries() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let mut bad = input("bad name");
        bad.email = "not-an-email".to_string();
        bad.password = "short".to_string();

        match service.register(bad).await {
            Err(AppError::Validation(fields)) => {
                assert!(fields.get("email").is_some());
                assert!(fields.get("username").is_some());
                assert!(fields.get("password").is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_view_is_subscribed() {
        let follow_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::follow(1, 1, 2)]]);
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), follow_db);

        let view = service
            .view(&fixtures::user(2, "bob"), &ctx_for(Some(fixtures::user(1, "ann"))))
            .await
            .unwrap();
        assert!(view.is_subscribed);

        // Anonymous viewers never see a subscription and cause no query
        let view = service
            .view(&fixtures::user(2, "bob"), &ctx_for(None))
            .await
            .unwrap();
        assert!(!view.is_subscribed);
    }

    #[tokio::test]
    async fn test_views_batch() {
        let follow_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::follow(1, 1, 3)]]);
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), follow_db);

        let users = vec![fixtures::user(2, "bob"), fixtures::user(3, "carol")];
        let views = service
            .views(&users, &ctx_for(Some(fixtures::user(1, "ann"))))
            .await
            .unwrap();

        assert!(!views[0].is_subscribed);
        assert!(views[1].is_subscribed);
    }

    #[tokio::test]
    async fn test_me_requires_viewer() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );
        assert!(matches!(
            service.me(&ctx_for(None)).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_set_password() {
        let mut viewer = fixtures::user(1, "ann");
        viewer.password = hash_password("old password").unwrap();

        let user_db =
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[viewer.clone()]]);
        let service = service(user_db, MockDatabase::new(DatabaseBackend::Postgres));
        let ctx = ctx_for(Some(viewer));

        let wrong = SetPasswordInput {
            new_password: "new password".to_string(),
            current_password: "guess".to_string(),
        };
        match service.set_password(&ctx, wrong).await {
            Err(AppError::Validation(fields)) => {
                assert!(fields.get("current_password").is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let right = SetPasswordInput {
            new_password: "new password".to_string(),
            current_password: "old password".to_string(),
        };
        service.set_password(&ctx, right).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_avatar_without_avatar_is_noop() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );
        let ctx = ctx_for(Some(fixtures::user(1, "ann")));
        service.delete_avatar(&ctx).await.unwrap();
    }
}
