//! crates/fridge_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database, HTTP framework or model SDK.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Inventory
//=========================================================================================

/// One named item in a user's fridge.
///
/// A stored record always has `quantity > 0`; reaching zero deletes it.
/// `name` is matched case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub quantity: i64,
}

/// How much of an item a removal should take out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveAmount {
    /// Subtract exactly this many; fails when fewer are stored.
    Amount(i64),
    /// Delete the record regardless of the stored quantity.
    All,
}

/// The result of an inventory mutation: a confirmation and the refreshed fridge.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub message: String,
    pub items: Vec<InventoryRecord>,
}

//=========================================================================================
// Recipe preferences
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookingTime {
    Any,
    Quick,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Caller-supplied constraints for recipe generation.
///
/// Every field defaults to "no constraint". Lists keep the caller's order so the
/// rendered prompt is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipePreferences {
    pub is_vegan: bool,
    pub is_spicy: bool,
    pub cuisines: Vec<String>,
    pub allergens: Vec<String>,
    pub cooking_time: Option<CookingTime>,
    pub difficulty: Option<Difficulty>,
    pub use_only_fridge_ingredients: bool,
}

//=========================================================================================
// Generation results
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub steps: String,
}

/// Exactly three recipes, as demanded by the generation schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSet {
    pub recipe1: Recipe,
    pub recipe2: Recipe,
    pub recipe3: Recipe,
}

impl RecipeSet {
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        [&self.recipe1, &self.recipe2, &self.recipe3].into_iter()
    }
}

/// An ingredient spotted in a photo. `quantity` is a free-form estimate such as "2 cups".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedIngredient {
    pub name: String,
    pub quantity: String,
}

/// Every shape a recipe-generation call can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeOutcome {
    Recipes(RecipeSet),
    /// The model used the structured path but its payload could not be read.
    ParseFailure { error: String, raw_arguments: String },
    /// The model ignored the schema and answered in free text.
    Fallback(String),
}

/// Every shape an image-extraction call can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngredientOutcome {
    Ingredients(Vec<ExtractedIngredient>),
    NoneDetected,
    ParseFailure { error: String, raw_arguments: String },
    Fallback(String),
}

//=========================================================================================
// Social
//=========================================================================================

/// A recipe a user has starred. `(user_id, title)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRecipe {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
}

/// The authenticated caller, as described by the identity provider's token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

/// A stored user profile. Fields left `None` fall back to the token's claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl From<UserProfile> for FriendSummary {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.user_id,
            name: profile.name.unwrap_or_default(),
            email: profile.email.unwrap_or_default(),
            picture: profile.picture.unwrap_or_default(),
        }
    }
}
