//! Favorite, shopping cart and subscription toggles.
//!
//! All three are a row linking an owner to a target; they share one
//! add/remove flow that differs only in how the target is loaded and which
//! table holds the row.

use foodgram_common::{AppError, AppResult};
use foodgram_db::{
    entities::{recipe, user},
    repositories::{
        FollowRepository, RecipeMark, RecipeMarkRepository, RecipeRepository, UserRepository,
    },
};

/// Which relation to toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Owner bookmarks a recipe.
    Favorite,
    /// Owner puts a recipe on the shopping list.
    ShoppingCart,
    /// Owner follows an author.
    Subscription,
}

impl RelationKind {
    const fn mark(self) -> Option<RecipeMark> {
        match self {
            Self::Favorite => Some(RecipeMark::Favorite),
            Self::ShoppingCart => Some(RecipeMark::ShoppingCart),
            Self::Subscription => None,
        }
    }

    const fn present_message(self) -> &'static str {
        match self {
            Self::Favorite => "Recipe is already in favorites",
            Self::ShoppingCart => "Recipe is already in the shopping cart",
            Self::Subscription => "Already subscribed to this author",
        }
    }

    const fn absent_message(self) -> &'static str {
        match self {
            Self::Favorite => "Recipe is not in favorites",
            Self::ShoppingCart => "Recipe is not in the shopping cart",
            Self::Subscription => "Not subscribed to this author",
        }
    }
}

/// The loaded target of a relation change.
#[derive(Debug, Clone)]
pub enum RelationTarget {
    /// A favorited or carted recipe.
    Recipe(recipe::Model),
    /// A followed author.
    Author(user::Model),
}

impl RelationTarget {
    /// The recipe of a favorite or cart change.
    pub fn into_recipe(self) -> AppResult<recipe::Model> {
        match self {
            Self::Recipe(recipe) => Ok(recipe),
            Self::Author(_) => Err(AppError::Internal(
                "Relation target is an author, not a recipe".to_string(),
            )),
        }
    }

    /// The author of a subscription change.
    pub fn into_author(self) -> AppResult<user::Model> {
        match self {
            Self::Author(author) => Ok(author),
            Self::Recipe(_) => Err(AppError::Internal(
                "Relation target is a recipe, not an author".to_string(),
            )),
        }
    }
}

/// Adds and removes favorite, cart and subscription rows.
#[derive(Clone)]
pub struct RelationService {
    user_repo: UserRepository,
    recipe_repo: RecipeRepository,
    follow_repo: FollowRepository,
    mark_repo: RecipeMarkRepository,
}

impl RelationService {
    /// Create a new relation service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        recipe_repo: RecipeRepository,
        follow_repo: FollowRepository,
        mark_repo: RecipeMarkRepository,
    ) -> Self {
        Self {
            user_repo,
            recipe_repo,
            follow_repo,
            mark_repo,
        }
    }

    /// Create the relation. The target must exist and the relation must not.
    pub async fn add(
        &self,
        kind: RelationKind,
        owner_id: i32,
        target_id: i32,
    ) -> AppResult<RelationTarget> {
        let target = self.load_target(kind, target_id).await?;

        if kind == RelationKind::Subscription && owner_id == target_id {
            return Err(AppError::Conflict(
                "You cannot subscribe to yourself".to_string(),
            ));
        }

        if self.exists(kind, owner_id, target_id).await? {
            return Err(AppError::Conflict(kind.present_message().to_string()));
        }

        // A concurrent add that slips past the check above fails on the
        // unique index and surfaces as the same conflict.
        let created = match kind.mark() {
            Some(mark) => self.mark_repo.create(mark, owner_id, target_id).await,
            None => self.follow_repo.create(owner_id, target_id).await.map(|_| ()),
        };
        created.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(kind.present_message().to_string()),
            other => other,
        })?;

        tracing::info!(?kind, owner_id, target_id, "Relation added");
        Ok(target)
    }

    /// Delete the relation. The target and the relation must exist.
    pub async fn remove(&self, kind: RelationKind, owner_id: i32, target_id: i32) -> AppResult<()> {
        self.load_target(kind, target_id).await?;

        let deleted = match kind.mark() {
            Some(mark) => self.mark_repo.delete(mark, owner_id, target_id).await?,
            None => self.follow_repo.delete_by_pair(owner_id, target_id).await?,
        };
        if deleted == 0 {
            return Err(AppError::Conflict(kind.absent_message().to_string()));
        }

        tracing::info!(?kind, owner_id, target_id, "Relation removed");
        Ok(())
    }

    async fn load_target(&self, kind: RelationKind, target_id: i32) -> AppResult<RelationTarget> {
        match kind {
            RelationKind::Favorite | RelationKind::ShoppingCart => self
                .recipe_repo
                .get_by_id(target_id)
                .await
                .map(RelationTarget::Recipe),
            RelationKind::Subscription => self
                .user_repo
                .get_by_id(target_id)
                .await
                .map(RelationTarget::Author),
        }
    }

    async fn exists(&self, kind: RelationKind, owner_id: i32, target_id: i32) -> AppResult<bool> {
        match kind.mark() {
            Some(mark) => self.mark_repo.exists(mark, owner_id, target_id).await,
            None => self.follow_repo.is_following(owner_id, target_id).await,
        }
    }
}
