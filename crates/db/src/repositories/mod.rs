//! Database repositories.

mod follow;
mod ingredient;
mod recipe;
mod recipe_mark;
mod user;

pub use follow::FollowRepository;
pub use ingredient::IngredientRepository;
pub use recipe::{RecipeFilter, RecipeRepository};
pub use recipe_mark::{RecipeMark, RecipeMarkRepository};
pub use user::UserRepository;
