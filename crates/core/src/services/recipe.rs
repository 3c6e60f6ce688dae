//! Recipe service.

use std::collections::{HashMap, HashSet};

use foodgram_common::{AppError, AppResult, FieldErrors};
use foodgram_db::{
    entities::{recipe, user},
    repositories::{
        FollowRepository, IngredientRepository, RecipeFilter, RecipeMark, RecipeMarkRepository,
        RecipeRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::context::RequestContext;
use crate::services::image::{DecodedImage, ImageService, decode_data_uri};
use crate::services::views::{RecipeIngredientView, RecipeView, UserView};

/// Storage directory for recipe images.
const RECIPE_IMAGE_DIR: &str = "recipes";

/// One `{id, amount}` entry of a recipe's ingredient list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    /// Ingredient ID.
    pub id: i32,
    /// Quantity in the ingredient's measurement unit.
    pub amount: i32,
}

/// Input for creating a recipe. Absent fields fail validation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateRecipeInput {
    pub ingredients: Vec<IngredientAmount>,

    /// Base64 data URI.
    #[validate(length(min = 1, message = "This field is required."))]
    pub image: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(min = 1))]
    pub text: String,

    #[validate(range(min = 1))]
    pub cooking_time: i32,
}

/// Input for updating a recipe. The ingredient list is always required and
/// replaces the stored one.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRecipeInput {
    pub ingredients: Option<Vec<IngredientAmount>>,

    /// Base64 data URI; the stored image is kept when absent.
    pub image: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(min = 1))]
    pub text: Option<String>,

    #[validate(range(min = 1))]
    pub cooking_time: Option<i32>,
}

/// Recipe list filters as given by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeListQuery {
    pub author: Option<i32>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeListQuery {
    /// Repository filter for this query. Viewer-relative filters are dropped
    /// for anonymous requests.
    #[must_use]
    pub fn to_filter(&self, ctx: &RequestContext) -> RecipeFilter {
        let viewer_id = ctx.viewer_id();
        RecipeFilter {
            author_id: self.author,
            favorited: viewer_id.zip(self.is_favorited),
            in_shopping_cart: viewer_id.zip(self.is_in_shopping_cart),
        }
    }
}

/// Recipe service for business logic.
#[derive(Clone)]
pub struct RecipeService {
    recipe_repo: RecipeRepository,
    ingredient_repo: IngredientRepository,
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    mark_repo: RecipeMarkRepository,
    images: ImageService,
}

impl RecipeService {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(
        recipe_repo: RecipeRepository,
        ingredient_repo: IngredientRepository,
        user_repo: UserRepository,
        follow_repo: FollowRepository,
        mark_repo: RecipeMarkRepository,
        images: ImageService,
    ) -> Self {
        Self {
            recipe_repo,
            ingredient_repo,
            user_repo,
            follow_repo,
            mark_repo,
            images,
        }
    }

    /// Get a recipe as seen by the viewer.
    pub async fn get(&self, id: i32, ctx: &RequestContext) -> AppResult<RecipeView> {
        let recipe = self.recipe_repo.get_by_id(id).await?;
        self.view(recipe, ctx).await
    }

    /// List recipes newest first (paginated), with the total count.
    pub async fn list(
        &self,
        query: &RecipeListQuery,
        ctx: &RequestContext,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<RecipeView>, u64)> {
        let filter = query.to_filter(ctx);
        let recipes = self.recipe_repo.list(&filter, offset, limit).await?;
        let count = self.recipe_repo.count(&filter).await?;
        Ok((self.views(&recipes, ctx).await?, count))
    }

    /// Create a recipe authored by the viewer.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateRecipeInput,
    ) -> AppResult<RecipeView> {
        let viewer = ctx.require_viewer()?;

        let mut errors = validation_errors(&input);
        check_ingredients(Some(input.ingredients.as_slice()), &mut errors);
        let image = if input.image.is_empty() {
            None
        } else {
            decode_image(&input.image, &mut errors)?
        };
        errors.into_result()?;
        self.ensure_ingredients_exist(&input.ingredients).await?;

        let Some(image) = image else {
            return Err(AppError::field("image", "This field is required."));
        };
        let image_url = self
            .images
            .store_decoded(RECIPE_IMAGE_DIR, &image)
            .await?;

        let model = recipe::ActiveModel {
            author_id: Set(viewer.id),
            name: Set(input.name),
            image: Set(image_url.clone()),
            text: Set(input.text),
            cooking_time: Set(input.cooking_time),
            pub_date: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let recipe = match self
            .recipe_repo
            .create(model, &amount_pairs(&input.ingredients))
            .await
        {
            Ok(recipe) => recipe,
            Err(e) => {
                self.images.remove(&image_url).await;
                return Err(e);
            }
        };

        tracing::info!(recipe_id = recipe.id, author_id = viewer.id, "Created recipe");
        self.view(recipe, ctx).await
    }

    /// Update a recipe. Only its author may do so.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i32,
        input: UpdateRecipeInput,
    ) -> AppResult<RecipeView> {
        let recipe = self.owned_recipe(ctx, id).await?;

        let mut errors = validation_errors(&input);
        check_ingredients(input.ingredients.as_deref(), &mut errors);
        let image = match input.image.as_deref() {
            Some(value) => decode_image(value, &mut errors)?,
            None => None,
        };
        errors.into_result()?;

        let ingredients = input.ingredients.unwrap_or_default();
        self.ensure_ingredients_exist(&ingredients).await?;

        let new_image_url = match &image {
            Some(image) => Some(self.images.store_decoded(RECIPE_IMAGE_DIR, image).await?),
            None => None,
        };

        let previous_image = recipe.image.clone();
        let mut active: recipe::ActiveModel = recipe.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = input.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if let Some(url) = &new_image_url {
            active.image = Set(url.clone());
        }

        let updated = match self
            .recipe_repo
            .update(active, &amount_pairs(&ingredients))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(url) = &new_image_url {
                    self.images.remove(url).await;
                }
                return Err(e);
            }
        };

        if new_image_url.is_some() {
            self.images.remove(&previous_image).await;
        }

        tracing::info!(recipe_id = updated.id, "Updated recipe");
        self.view(updated, ctx).await
    }

    /// Delete a recipe. Only its author may do so.
    pub async fn delete(&self, ctx: &RequestContext, id: i32) -> AppResult<()> {
        let recipe = self.owned_recipe(ctx, id).await?;

        self.recipe_repo.delete(recipe.id).await?;
        self.images.remove(&recipe.image).await;

        tracing::info!(recipe_id = recipe.id, "Deleted recipe");
        Ok(())
    }

    /// Full view of one recipe.
    pub async fn view(&self, recipe: recipe::Model, ctx: &RequestContext) -> AppResult<RecipeView> {
        self.views(std::slice::from_ref(&recipe), ctx)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("No view built for recipe {}", recipe.id)))
    }

    /// Full views of several recipes, loading authors, ingredient rows and
    /// viewer flags once for the batch.
    pub async fn views(
        &self,
        recipes: &[recipe::Model],
        ctx: &RequestContext,
    ) -> AppResult<Vec<RecipeView>> {
        if recipes.is_empty() {
            return Ok(vec![]);
        }

        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<i32, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let (followed, favorited, carted): (HashSet<i32>, HashSet<i32>, HashSet<i32>) =
            match ctx.viewer_id() {
                Some(viewer_id) => (
                    self.follow_repo
                        .followed_among(viewer_id, &author_ids)
                        .await?
                        .into_iter()
                        .collect(),
                    self.mark_repo
                        .marked_among(RecipeMark::Favorite, viewer_id, &recipe_ids)
                        .await?
                        .into_iter()
                        .collect(),
                    self.mark_repo
                        .marked_among(RecipeMark::ShoppingCart, viewer_id, &recipe_ids)
                        .await?
                        .into_iter()
                        .collect(),
                ),
                None => Default::default(),
            };

        let mut ingredients: HashMap<i32, Vec<RecipeIngredientView>> = HashMap::new();
        for (row, ingredient) in self.recipe_repo.ingredients_of(&recipe_ids).await? {
            ingredients
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeIngredientView::new(&row, &ingredient));
        }

        recipes
            .iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).ok_or_else(|| {
                    AppError::Internal(format!("Author of recipe {} is missing", recipe.id))
                })?;
                Ok(RecipeView {
                    id: recipe.id,
                    author: UserView::new(author, followed.contains(&author.id)),
                    name: recipe.name.clone(),
                    image: recipe.image.clone(),
                    text: recipe.text.clone(),
                    cooking_time: recipe.cooking_time,
                    ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: carted.contains(&recipe.id),
                })
            })
            .collect()
    }

    async fn owned_recipe(&self, ctx: &RequestContext, id: i32) -> AppResult<recipe::Model> {
        let viewer = ctx.require_viewer()?;
        let recipe = self.recipe_repo.get_by_id(id).await?;
        if recipe.author_id != viewer.id {
            return Err(AppError::Forbidden(
                "Only the author can change this recipe".to_string(),
            ));
        }
        Ok(recipe)
    }

    async fn ensure_ingredients_exist(&self, items: &[IngredientAmount]) -> AppResult<()> {
        let ids: Vec<i32> = items.iter().map(|i| i.id).collect();
        let found: HashSet<i32> = self
            .ingredient_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(ToString::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::field(
                "ingredients",
                format!("Unknown ingredient: {}", missing.join(", ")),
            ))
        }
    }
}

fn validation_errors(input: &impl Validate) -> FieldErrors {
    input
        .validate()
        .err()
        .map(FieldErrors::from)
        .unwrap_or_default()
}

/// Structural checks on an ingredient list: present, non-empty, distinct
/// IDs, positive amounts.
fn check_ingredients(items: Option<&[IngredientAmount]>, errors: &mut FieldErrors) {
    let Some(items) = items else {
        errors.add("ingredients", "This field is required.");
        return;
    };
    if items.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
        return;
    }

    let mut seen = HashSet::with_capacity(items.len());
    if !items.iter().all(|item| seen.insert(item.id)) {
        errors.add("ingredients", "Ingredients must not repeat.");
    }

    for (index, item) in items.iter().enumerate() {
        if item.amount < 1 {
            errors.add(
                format!("ingredients[{index}].amount"),
                "Ensure this value is greater than or equal to 1.",
            );
        }
    }
}

/// Decode the image, moving a decoding failure into `errors`.
fn decode_image(value: &str, errors: &mut FieldErrors) -> AppResult<Option<DecodedImage>> {
    match decode_data_uri("image", value) {
        Ok(image) => Ok(Some(image)),
        Err(AppError::Validation(fields)) => {
            errors.merge(fields);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn amount_pairs(items: &[IngredientAmount]) -> Vec<(i32, i32)> {
    items.iter().map(|i| (i.id, i.amount)).collect()
}
