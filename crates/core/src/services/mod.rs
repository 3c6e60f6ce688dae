//! Business logic services.

#![allow(missing_docs)]

pub mod context;
pub mod image;
pub mod ingredient;
pub mod recipe;
pub mod relation;
pub mod shopping_list;
pub mod short_link;
pub mod subscription;
pub mod user;
pub mod views;

pub use context::RequestContext;
pub use image::{ImageFormat, ImageService};
pub use ingredient::{IngredientImportRow, IngredientService};
pub use recipe::{
    CreateRecipeInput, IngredientAmount, RecipeListQuery, RecipeService, UpdateRecipeInput,
};
pub use relation::{RelationKind, RelationService, RelationTarget};
pub use shopping_list::{ShoppingCartService, ShoppingList};
pub use short_link::ShortLinkService;
pub use subscription::SubscriptionService;
pub use user::{CreateUserInput, SetPasswordInput, UserService};
pub use views::{
    RecipeIngredientView, RecipeShortView, RecipeView, SubscriptionView, UserCreatedView,
    UserView,
};
