//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `foodgram_test`)
//!   `TEST_DB_PASSWORD` (default: `foodgram_test`)
//!   `TEST_DB_NAME` (default: `foodgram_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use foodgram_common::AppError;
use foodgram_db::entities::{recipe, user};
use foodgram_db::repositories::{
    FollowRepository, IngredientRepository, RecipeFilter, RecipeMark, RecipeMarkRepository,
    RecipeRepository, UserRepository,
};
use foodgram_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{DatabaseConnection, Set};

async fn migrated() -> (TestDatabase, Arc<DatabaseConnection>) {
    let db = TestDatabase::create_migrated()
        .await
        .expect("Failed to create database");
    let conn = Arc::new(db.connection().clone());
    (db, conn)
}

async fn create_user(conn: &Arc<DatabaseConnection>, username: &str) -> user::Model {
    UserRepository::new(conn.clone())
        .create(user::ActiveModel {
            email: Set(format!("{username}@example.com")),
            username: Set(username.to_string()),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            password: Set("hash".to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap()
}

fn new_recipe(author_id: i32, name: &str) -> recipe::ActiveModel {
    recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(name.to_string()),
        image: Set("/media/recipes/x.png".to_string()),
        text: Set("Cook it.".to_string()),
        cooking_time: Set(5),
        pub_date: Set(Utc::now().into()),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::connect(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_recipe_ingredients_replaced_on_update() {
    let (db, conn) = migrated().await;
    let author = create_user(&conn, "chef").await;

    let ingredients = IngredientRepository::new(conn.clone());
    ingredients
        .insert_many(
            vec![
                ("flour".to_string(), "g".to_string()),
                ("milk".to_string(), "ml".to_string()),
            ],
            1,
        )
        .await
        .unwrap();
    let found = ingredients.search(None).await.unwrap();
    let (flour, milk) = (found[0].id, found[1].id);

    let recipes = RecipeRepository::new(conn.clone());
    let created = recipes
        .create(new_recipe(author.id, "Pancakes"), &[(flour, 200), (milk, 300)])
        .await
        .unwrap();
    assert_eq!(recipes.ingredients_of(&[created.id]).await.unwrap().len(), 2);

    let mut active: recipe::ActiveModel = created.clone().into();
    active.name = Set("Thin pancakes".to_string());
    recipes.update(active, &[(milk, 500)]).await.unwrap();

    let rows = recipes.ingredients_of(&[created.id]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0.amount, 500);
    assert_eq!(rows[0].1.name, "milk");

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_mark_is_conflict() {
    let (db, conn) = migrated().await;
    let author = create_user(&conn, "chef").await;
    let recipe = RecipeRepository::new(conn.clone())
        .create(new_recipe(author.id, "Soup"), &[])
        .await
        .unwrap();

    let marks = RecipeMarkRepository::new(conn.clone());
    marks.create(RecipeMark::Favorite, author.id, recipe.id).await.unwrap();
    let second = marks.create(RecipeMark::Favorite, author.id, recipe.id).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    // The cart is a separate table
    marks
        .create(RecipeMark::ShoppingCart, author.id, recipe.id)
        .await
        .unwrap();

    let filter = RecipeFilter {
        favorited: Some((author.id, true)),
        ..Default::default()
    };
    assert_eq!(RecipeRepository::new(conn.clone()).count(&filter).await.unwrap(), 1);

    let filter = RecipeFilter {
        in_shopping_cart: Some((author.id, false)),
        ..Default::default()
    };
    assert_eq!(RecipeRepository::new(conn.clone()).count(&filter).await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_follow_pair_unique() {
    let (db, conn) = migrated().await;
    let reader = create_user(&conn, "reader").await;
    let author = create_user(&conn, "author").await;

    let follows = FollowRepository::new(conn.clone());
    follows.create(reader.id, author.id).await.unwrap();
    assert!(matches!(
        follows.create(reader.id, author.id).await,
        Err(AppError::Conflict(_))
    ));

    let authors = follows.find_authors(reader.id, 0, 10).await.unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].id, author.id);

    assert_eq!(follows.delete_by_pair(reader.id, author.id).await.unwrap(), 1);
    assert_eq!(follows.delete_by_pair(reader.id, author.id).await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}
