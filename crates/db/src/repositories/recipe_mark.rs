//! Favorite and shopping cart repository.
//!
//! Both tables are (user, recipe) membership rows with identical columns, so
//! one repository serves them, parameterized by [`RecipeMark`].

use std::sync::Arc;

use crate::insert_error;
use foodgram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{Query, SelectStatement},
};

/// A per-user mark on a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeMark {
    /// Bookmarked recipe (`favorite` table).
    Favorite,
    /// Recipe selected for the shopping list (`shopping_cart` table).
    ShoppingCart,
}

impl RecipeMark {
    /// Human-readable name used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorite => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

/// Run `$body` with `$m` bound to the entity module of `$mark`.
macro_rules! with_mark {
    ($mark:expr, $m:ident => $body:expr) => {
        match $mark {
            RecipeMark::Favorite => {
                use crate::entities::favorite as $m;
                $body
            }
            RecipeMark::ShoppingCart => {
                use crate::entities::shopping_cart as $m;
                $body
            }
        }
    };
}

/// Repository for favorite and shopping cart rows.
#[derive(Clone)]
pub struct RecipeMarkRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeMarkRepository {
    /// Create a new recipe mark repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether the user has marked the recipe.
    pub async fn exists(&self, mark: RecipeMark, user_id: i32, recipe_id: i32) -> AppResult<bool> {
        with_mark!(mark, m => {
            m::Entity::find()
                .filter(m::Column::UserId.eq(user_id))
                .filter(m::Column::RecipeId.eq(recipe_id))
                .one(self.db.as_ref())
                .await
                .map(|row| row.is_some())
        })
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a recipe. A duplicate mark is reported as a conflict.
    pub async fn create(&self, mark: RecipeMark, user_id: i32, recipe_id: i32) -> AppResult<()> {
        let conflict = format!("Recipe already in {}", mark.label());
        let now = chrono::Utc::now();

        with_mark!(mark, m => {
            m::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now.into()),
                ..Default::default()
            }
            .insert(self.db.as_ref())
            .await
            .map(|_| ())
        })
        .map_err(|e| insert_error(e, &conflict))
    }

    /// Remove a mark. Returns the number of deleted rows.
    pub async fn delete(&self, mark: RecipeMark, user_id: i32, recipe_id: i32) -> AppResult<u64> {
        let result = with_mark!(mark, m => {
            m::Entity::delete_many()
                .filter(m::Column::UserId.eq(user_id))
                .filter(m::Column::RecipeId.eq(recipe_id))
                .exec(self.db.as_ref())
                .await
        })
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Recipe IDs the user has marked, in the order they were marked.
    pub async fn recipe_ids(&self, mark: RecipeMark, user_id: i32) -> AppResult<Vec<i32>> {
        with_mark!(mark, m => {
            m::Entity::find()
                .filter(m::Column::UserId.eq(user_id))
                .order_by_asc(m::Column::Id)
                .all(self.db.as_ref())
                .await
                .map(|rows| rows.into_iter().map(|row| row.recipe_id).collect())
        })
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Of the given recipes, those the user has marked.
    pub async fn marked_among(
        &self,
        mark: RecipeMark,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> AppResult<Vec<i32>> {
        if recipe_ids.is_empty() {
            return Ok(vec![]);
        }

        with_mark!(mark, m => {
            m::Entity::find()
                .filter(m::Column::UserId.eq(user_id))
                .filter(m::Column::RecipeId.is_in(recipe_ids.to_vec()))
                .all(self.db.as_ref())
                .await
                .map(|rows| rows.into_iter().map(|row| row.recipe_id).collect())
        })
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// `SELECT recipe_id FROM <mark> WHERE user_id = ?`, for recipe filters.
    #[must_use]
    pub fn recipe_ids_query(mark: RecipeMark, user_id: i32) -> SelectStatement {
        with_mark!(mark, m => {
            Query::select()
                .column(m::Column::RecipeId)
                .from(m::Entity)
                .and_where(m::Column::UserId.eq(user_id))
                .to_owned()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::{favorite, shopping_cart};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_exists_per_mark() {
        let fav = favorite::Model {
            id: 1,
            user_id: 1,
            recipe_id: 10,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fav]])
                .append_query_results([Vec::<shopping_cart::Model>::new()])
                .into_connection(),
        );

        let repo = RecipeMarkRepository::new(db);

        assert!(repo.exists(RecipeMark::Favorite, 1, 10).await.unwrap());
        assert!(!repo.exists(RecipeMark::ShoppingCart, 1, 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = RecipeMarkRepository::new(db);

        assert_eq!(repo.delete(RecipeMark::ShoppingCart, 1, 10).await.unwrap(), 0);
    }

    #[test]
    fn test_recipe_ids_query_targets_table() {
        use sea_orm::sea_query::PostgresQueryBuilder;

        let sql = RecipeMarkRepository::recipe_ids_query(RecipeMark::ShoppingCart, 7)
            .to_string(PostgresQueryBuilder);

        assert!(sql.contains("FROM \"shopping_cart\""));
        assert!(sql.contains("\"user_id\" = 7"));
    }
}
