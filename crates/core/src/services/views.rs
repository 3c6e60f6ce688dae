//! Read shapes returned to API clients.

use foodgram_db::entities::{ingredient, recipe, recipe_ingredient, user};
use serde::Serialize;

/// Registration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCreatedView {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&user::Model> for UserCreatedView {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Public profile as seen by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the viewer follows this user.
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserView {
    /// Build a profile view.
    #[must_use]
    pub fn new(user: &user::Model, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.clone(),
        }
    }
}

/// Compact recipe used in favorite/cart responses and subscription listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeShortView {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&recipe::Model> for RecipeShortView {
    fn from(recipe: &recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredientView {
    /// Ingredient ID (not the association row ID).
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl RecipeIngredientView {
    /// Join an association row with its ingredient.
    #[must_use]
    pub fn new(row: &recipe_ingredient::Model, ingredient: &ingredient::Model) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name.clone(),
            measurement_unit: ingredient.measurement_unit.clone(),
            amount: row.amount,
        }
    }
}

/// Full recipe read shape, computed for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeView {
    pub id: i32,
    pub author: UserView,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipeShortView>,
    /// Number of recipes before truncation.
    pub recipes_count: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_db::test_utils::fixtures;
    use serde_json::json;

    #[test]
    fn test_subscription_view_flattens_user() {
        let author = fixtures::user(2, "bob");
        let view = SubscriptionView {
            user: UserView::new(&author, true),
            recipes: vec![RecipeShortView::from(&fixtures::recipe(9, 2))],
            recipes_count: 4,
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["username"], "bob");
        assert_eq!(value["is_subscribed"], true);
        assert_eq!(value["recipes_count"], 4);
        assert_eq!(
            value["recipes"][0],
            json!({
                "id": 9,
                "name": "Recipe 9",
                "image": "/media/recipes/9.png",
                "cooking_time": 10,
            })
        );
    }
}
