//! Shopping list aggregation over a user's cart.

use std::collections::{BTreeMap, HashMap};

use foodgram_common::{AppError, AppResult};
use foodgram_db::repositories::{RecipeMark, RecipeMarkRepository, RecipeRepository};

use crate::services::context::RequestContext;

/// Header line of the rendered list.
const HEADER: &str = "Shopping list:";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    unit: String,
    total: i64,
}

/// Ingredient totals keyed by name, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    lines: BTreeMap<String, Line>,
}

impl ShoppingList {
    /// Sum `(name, unit, amount)` rows by ingredient name.
    ///
    /// Units are not reconciled: the unit of the last row seen for a name is kept.
    pub fn aggregate<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, i32)>,
    {
        let mut lines: BTreeMap<String, Line> = BTreeMap::new();
        for (name, unit, amount) in rows {
            let line = lines.entry(name.to_string()).or_insert_with(|| Line {
                unit: String::new(),
                total: 0,
            });
            line.unit = unit.to_string();
            line.total += i64::from(amount);
        }
        Self { lines }
    }

    /// Whether the list has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct ingredients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total and unit recorded for an ingredient.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<(&str, i64)> {
        self.lines
            .get(name)
            .map(|line| (line.unit.as_str(), line.total))
    }

    /// Plain-text document: header, blank line, one `- name (unit): total` per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = vec![HEADER.to_string(), String::new()];
        out.extend(
            self.lines
                .iter()
                .map(|(name, line)| format!("- {name} ({}): {}", line.unit, line.total)),
        );
        out.join("\n")
    }
}

/// Builds the downloadable shopping list of the viewer's cart.
#[derive(Clone)]
pub struct ShoppingCartService {
    mark_repo: RecipeMarkRepository,
    recipe_repo: RecipeRepository,
}

impl ShoppingCartService {
    /// Create a new shopping cart service.
    #[must_use]
    pub const fn new(mark_repo: RecipeMarkRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            mark_repo,
            recipe_repo,
        }
    }

    /// Aggregate the viewer's cart. An empty cart is a client error.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<ShoppingList> {
        let viewer = ctx.require_viewer()?;

        let recipe_ids = self
            .mark_repo
            .recipe_ids(RecipeMark::ShoppingCart, viewer.id)
            .await?;
        if recipe_ids.is_empty() {
            return Err(AppError::BadRequest("Shopping cart is empty".to_string()));
        }

        let rows = self.recipe_repo.ingredients_of(&recipe_ids).await?;

        // Cart order first, then row order within each recipe
        let mut by_recipe: HashMap<i32, Vec<_>> = HashMap::new();
        for (row, ingredient) in &rows {
            by_recipe
                .entry(row.recipe_id)
                .or_default()
                .push((ingredient.name.as_str(), ingredient.measurement_unit.as_str(), row.amount));
        }
        let ordered = recipe_ids
            .iter()
            .filter_map(|id| by_recipe.remove(id))
            .flatten();

        let list = ShoppingList::aggregate(ordered);
        tracing::debug!(
            user_id = viewer.id,
            recipes = recipe_ids.len(),
            ingredients = list.len(),
            "Aggregated shopping list"
        );
        Ok(list)
    }

    /// Rendered shopping list document.
    pub async fn download(&self, ctx: &RequestContext) -> AppResult<String> {
        Ok(self.list(ctx).await?.render())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_db::entities::{ingredient, recipe_ingredient, shopping_cart};
    use foodgram_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_aggregate_sums_and_sorts() {
        let list = ShoppingList::aggregate([
            ("sugar", "g", 100),
            ("flour", "g", 200),
            ("sugar", "g", 50),
        ]);

        assert_eq!(list.len(), 2);
        assert_eq!(list.get("sugar"), Some(("g", 150)));
        assert_eq!(
            list.render(),
            "Shopping list:\n\n- flour (g): 200\n- sugar (g): 150"
        );
    }

    #[test]
    fn test_last_unit_wins() {
        let list = ShoppingList::aggregate([("milk", "ml", 200), ("milk", "cup", 1)]);
        assert_eq!(list.get("milk"), Some(("cup", 201)));
    }

    #[test]
    fn test_totals_do_not_overflow_i32() {
        let list = ShoppingList::aggregate([("salt", "g", i32::MAX), ("salt", "g", i32::MAX)]);
        assert_eq!(list.get("salt"), Some(("g", 2 * i64::from(i32::MAX))));
    }

    #[test]
    fn test_sort_is_by_code_point() {
        let list = ShoppingList::aggregate([("apple", "pc", 1), ("Zucchini", "pc", 1)]);
        assert!(list.render().ends_with("- Zucchini (pc): 1\n- apple (pc): 1"));
    }

    fn service(
        cart: Vec<shopping_cart::Model>,
        rows: Vec<(recipe_ingredient::Model, ingredient::Model)>,
    ) -> ShoppingCartService {
        let mark_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([cart])
                .into_connection(),
        );
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        );
        ShoppingCartService::new(
            RecipeMarkRepository::new(mark_db),
            RecipeRepository::new(recipe_db),
        )
    }

    #[tokio::test]
    async fn test_download_requires_viewer() {
        let service = service(vec![], vec![]);
        let ctx = RequestContext::anonymous("http://localhost");
        assert!(matches!(
            service.download(&ctx).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_download_rejects_empty_cart() {
        let service = service(vec![], vec![]);
        let ctx = RequestContext::anonymous("http://localhost")
            .with_viewer(Some(fixtures::user(1, "alice")));

        assert!(matches!(
            service.download(&ctx).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_download_merges_cart_recipes() {
        let salt = fixtures::ingredient(1, "salt", "g");
        let egg = fixtures::ingredient(2, "egg", "pc");
        let service = service(
            vec![fixtures::cart_entry(1, 1, 10), fixtures::cart_entry(2, 1, 11)],
            vec![
                (fixtures::recipe_ingredient(1, 10, 1, 5), salt.clone()),
                (fixtures::recipe_ingredient(2, 10, 2, 2), egg.clone()),
                (fixtures::recipe_ingredient(3, 11, 1, 3), salt),
            ],
        );
        let ctx = RequestContext::anonymous("http://localhost")
            .with_viewer(Some(fixtures::user(1, "alice")));

        let text = service.download(&ctx).await.unwrap();
        assert_eq!(text, "Shopping list:\n\n- egg (pc): 2\n- salt (g): 8");
    }
}
