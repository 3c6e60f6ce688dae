//! Recipe repository.

use std::sync::Arc;

use crate::entities::{Recipe, RecipeIngredient, ingredient, recipe, recipe_ingredient};
use crate::repositories::recipe_mark::{RecipeMark, RecipeMarkRepository};
use foodgram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

/// Filters for recipe listings.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Only recipes by this author.
    pub author_id: Option<i32>,
    /// `(user, wanted)`: keep recipes whose favorite state for `user` equals `wanted`.
    pub favorited: Option<(i32, bool)>,
    /// `(user, wanted)`: keep recipes whose cart state for `user` equals `wanted`.
    pub in_shopping_cart: Option<(i32, bool)>,
}

impl RecipeFilter {
    fn apply(&self, mut query: Select<Recipe>) -> Select<Recipe> {
        if let Some(author_id) = self.author_id {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }
        for (mark, state) in [
            (RecipeMark::Favorite, self.favorited),
            (RecipeMark::ShoppingCart, self.in_shopping_cart),
        ] {
            if let Some((user_id, wanted)) = state {
                let subquery = RecipeMarkRepository::recipe_ids_query(mark, user_id);
                query = if wanted {
                    query.filter(recipe::Column::Id.in_subquery(subquery))
                } else {
                    query.filter(recipe::Column::Id.not_in_subquery(subquery))
                };
            }
        }
        query
    }
}

/// Recipe repository for database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a recipe by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<recipe::Model>> {
        Recipe::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a recipe by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<recipe::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RecipeNotFound(id.to_string()))
    }

    /// List recipes, newest first (paginated).
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<recipe::Model>> {
        filter
            .apply(Recipe::find())
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recipes matching a filter.
    pub async fn count(&self, filter: &RecipeFilter) -> AppResult<u64> {
        filter
            .apply(Recipe::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recipes by an author, newest first, optionally truncated.
    pub async fn find_by_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> AppResult<Vec<recipe::Model>> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recipes by an author.
    pub async fn count_by_author(&self, author_id: i32) -> AppResult<u64> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ingredient rows of the given recipes with their ingredient, in insertion order.
    pub async fn ingredients_of(
        &self,
        recipe_ids: &[i32],
    ) -> AppResult<Vec<(recipe_ingredient::Model, ingredient::Model)>> {
        if recipe_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = RecipeIngredient::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .order_by_asc(recipe_ingredient::Column::Id)
            .find_also_related(ingredient::Entity)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(row, ingredient)| ingredient.map(|i| (row, i)))
            .collect())
    }

    /// Insert a recipe and its ingredient rows in one transaction.
    pub async fn create(
        &self,
        model: recipe::ActiveModel,
        ingredients: &[(i32, i32)],
    ) -> AppResult<recipe::Model> {
        let txn = self.begin().await?;

        let recipe = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        insert_ingredients(&txn, recipe.id, ingredients).await?;

        commit(txn).await?;
        Ok(recipe)
    }

    /// Update a recipe and replace its ingredient rows in one transaction.
    pub async fn update(
        &self,
        model: recipe::ActiveModel,
        ingredients: &[(i32, i32)],
    ) -> AppResult<recipe::Model> {
        let txn = self.begin().await?;

        let recipe = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        RecipeIngredient::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        insert_ingredients(&txn, recipe.id, ingredients).await?;

        commit(txn).await?;
        Ok(recipe)
    }

    /// Delete a recipe. Ingredient rows, favorites and cart entries cascade.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        Recipe::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

async fn insert_ingredients(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    ingredients: &[(i32, i32)],
) -> AppResult<()> {
    if ingredients.is_empty() {
        return Ok(());
    }

    let rows = ingredients
        .iter()
        .map(|&(ingredient_id, amount)| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
            amount: Set(amount),
            ..Default::default()
        });

    RecipeIngredient::insert_many(rows)
        .exec_without_returning(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);

        assert!(matches!(
            repo.get_by_id(255).await,
            Err(AppError::RecipeNotFound(id)) if id == "255"
        ));
    }

    #[tokio::test]
    async fn test_list_returns_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::recipe(2, 1), fixtures::recipe(1, 1)]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let filter = RecipeFilter {
            author_id: Some(1),
            favorited: Some((5, true)),
            in_shopping_cart: Some((5, false)),
        };
        let result = repo.list(&filter, 0, 6).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 2);
    }

    #[tokio::test]
    async fn test_update_replaces_ingredients() {
        let updated = fixtures::recipe(7, 1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[updated.clone()]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 15,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let mut active: recipe::ActiveModel = updated.into();
        active.name = Set("Renamed".to_string());

        let result = repo.update(active, &[(3, 1)]).await.unwrap();
        assert_eq!(result.id, 7);
    }

    #[tokio::test]
    async fn test_ingredients_of_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = RecipeRepository::new(db);
        assert!(repo.ingredients_of(&[]).await.unwrap().is_empty());
    }
}
