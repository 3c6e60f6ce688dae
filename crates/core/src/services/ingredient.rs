//! Ingredient catalogue service.

use foodgram_common::{AppError, AppResult, FieldErrors};
use foodgram_db::{entities::ingredient, repositories::IngredientRepository};
use serde::Deserialize;
use validator::Validate;

/// Rows per insert statement during import.
const IMPORT_BATCH_SIZE: usize = 500;

/// One entry of an ingredient import file.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngredientImportRow {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 10))]
    pub measurement_unit: String,
}

/// Ingredient service for business logic.
#[derive(Clone)]
pub struct IngredientService {
    ingredient_repo: IngredientRepository,
}

impl IngredientService {
    /// Create a new ingredient service.
    #[must_use]
    pub const fn new(ingredient_repo: IngredientRepository) -> Self {
        Self { ingredient_repo }
    }

    /// All ingredients ordered by name, filtered by case-insensitive name prefix.
    pub async fn search(&self, name: Option<&str>) -> AppResult<Vec<ingredient::Model>> {
        self.ingredient_repo.search(name).await
    }

    /// Get an ingredient by ID.
    pub async fn get(&self, id: i32) -> AppResult<ingredient::Model> {
        self.ingredient_repo.get_by_id(id).await
    }

    /// Import a JSON array of `{"name", "measurement_unit"}` objects.
    ///
    /// The whole file is validated before anything is written, and the rows
    /// are written in a single transaction.
    pub async fn import_json(&self, json: &[u8]) -> AppResult<u64> {
        let rows: Vec<IngredientImportRow> = serde_json::from_slice(json)
            .map_err(|e| AppError::BadRequest(format!("Invalid ingredient file: {e}")))?;

        let mut errors = FieldErrors::new();
        for (index, row) in rows.iter().enumerate() {
            if let Err(e) = row.validate() {
                for (field, messages) in FieldErrors::from(e).iter() {
                    for message in messages {
                        errors.add(format!("[{index}].{field}"), message.clone());
                    }
                }
            }
        }
        errors.into_result()?;

        let items = rows
            .into_iter()
            .map(|row| (row.name, row.measurement_unit))
            .collect();
        let imported = self
            .ingredient_repo
            .insert_many(items, IMPORT_BATCH_SIZE)
            .await?;

        tracing::info!(count = imported, "Imported ingredients");
        Ok(imported)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ingredient::Model>::new()])
                .into_connection(),
        );
        let service = IngredientService::new(IngredientRepository::new(db));

        assert!(matches!(
            service.get(9).await,
            Err(AppError::IngredientNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_passes_rows_through() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    fixtures::ingredient(1, "salt", "g"),
                    fixtures::ingredient(2, "sugar", "g"),
                ]])
                .into_connection(),
        );
        let service = IngredientService::new(IngredientRepository::new(db));

        let found = service.search(Some("S")).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_import_json() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 2,
                    rows_affected: 2,
                }])
                .into_connection(),
        );
        let service = IngredientService::new(IngredientRepository::new(db));

        let json = br#"[
            {"name": "salt", "measurement_unit": "g"},
            {"name": "milk", "measurement_unit": "ml"}
        ]"#;
        assert_eq!(service.import_json(json).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_validates_before_writing() {
        // No exec results: any write would fail
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = IngredientService::new(IngredientRepository::new(db));

        let json = br#"[
            {"name": "salt", "measurement_unit": "g"},
            {"name": "", "measurement_unit": "ml"}
        ]"#;
        match service.import_json(json).await {
            Err(AppError::Validation(fields)) => assert!(fields.get("[1].name").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            service.import_json(b"{}").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
