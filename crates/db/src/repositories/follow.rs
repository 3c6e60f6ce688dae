//! Follow (subscription) repository.

use std::sync::Arc;

use crate::entities::{Follow, User, follow, user};
use crate::insert_error;
use foodgram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::Query,
};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow by subscriber and author.
    pub async fn find_by_pair(
        &self,
        user_id: i32,
        author_id: i32,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user follows an author.
    pub async fn is_following(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, author_id).await?.is_some())
    }

    /// Create a follow. A duplicate pair is reported as a conflict.
    pub async fn create(&self, user_id: i32, author_id: i32) -> AppResult<follow::Model> {
        let model = follow::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| insert_error(e, "Already subscribed"))
    }

    /// Delete a follow by pair. Returns the number of deleted rows.
    pub async fn delete_by_pair(&self, user_id: i32, author_id: i32) -> AppResult<u64> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Authors a user follows, ordered by author ID (paginated).
    pub async fn find_authors(
        &self,
        user_id: i32,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(
                user::Column::Id.in_subquery(
                    Query::select()
                        .column(follow::Column::AuthorId)
                        .from(Follow)
                        .and_where(follow::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(user::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count authors a user follows.
    pub async fn count_authors(&self, user_id: i32) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Of the given authors, those the user follows.
    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> AppResult<Vec<i32>> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.is_in(author_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|f| f.author_id).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_follow(id: i32, user_id: i32, author_id: i32) -> follow::Model {
        follow::Model {
            id,
            user_id,
            author_id,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_following() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow(1, 1, 2)]])
                .append_query_results([Vec::<follow::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);

        assert!(repo.is_following(1, 2).await.unwrap());
        assert!(!repo.is_following(2, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);

        assert_eq!(repo.delete_by_pair(1, 2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_followed_among_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = FollowRepository::new(db);

        assert!(repo.followed_among(1, &[]).await.unwrap().is_empty());
    }
}
