//! Create favorite and shopping_cart tables migration.
//!
//! Both tables share one shape: a (user, recipe) membership row.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Tables created by this migration, with their index name prefix.
const TABLES: [(RelationTable, &str); 2] = [
    (RelationTable::Favorite, "favorite"),
    (RelationTable::ShoppingCart, "shopping_cart"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, prefix) in TABLES {
            manager
                .create_table(
                    Table::create()
                        .table(table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RelationColumn::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(RelationColumn::UserId).integer().not_null())
                        .col(ColumnDef::new(RelationColumn::RecipeId).integer().not_null())
                        .col(
                            ColumnDef::new(RelationColumn::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name(format!("fk_{prefix}_user"))
                                .from(table, RelationColumn::UserId)
                                .to(User::Table, User::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name(format!("fk_{prefix}_recipe"))
                                .from(table, RelationColumn::RecipeId)
                                .to(Recipe::Table, Recipe::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Unique index: (user_id, recipe_id)
            manager
                .create_index(
                    Index::create()
                        .name(format!("idx_{prefix}_user_recipe"))
                        .table(table)
                        .col(RelationColumn::UserId)
                        .col(RelationColumn::RecipeId)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, _) in TABLES {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(Iden, Clone, Copy)]
enum RelationTable {
    Favorite,
    ShoppingCart,
}

#[derive(Iden)]
enum RelationColumn {
    Id,
    UserId,
    RecipeId,
    CreatedAt,
}

#[derive(Iden)]
enum Recipe {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
