//! services/api/src/web/recipes.rs
//!
//! Axum handlers for recipe generation and ingredient extraction from photos.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use fridge_core::{
    ExtractedIngredient, Identity, IngredientOutcome, Recipe, RecipeOutcome, RecipePreferences,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::HttpError;
use crate::web::state::AppState;

const IMAGE_FIELD: &str = "image_file";
const ALLOWED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// `isVegan`, `isSpicy`, `cuisines`, `allergens`, `cookingTime`, `difficulty`,
    /// `useOnlyFridgeIngredients`; every field optional.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<RecipePreferences>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeBody {
    pub name: String,
    pub ingredients: Vec<String>,
    pub steps: String,
}

impl From<Recipe> for RecipeBody {
    fn from(recipe: Recipe) -> Self {
        Self {
            name: recipe.name,
            ingredients: recipe.ingredients,
            steps: recipe.steps,
        }
    }
}

/// One of three shapes, told apart by their keys.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum GenerationResponse {
    Recipes {
        recipe1: RecipeBody,
        recipe2: RecipeBody,
        recipe3: RecipeBody,
    },
    ParseFailure {
        error: String,
        raw_arguments: String,
    },
    Fallback {
        fallback_content: String,
    },
}

impl From<RecipeOutcome> for GenerationResponse {
    fn from(outcome: RecipeOutcome) -> Self {
        match outcome {
            RecipeOutcome::Recipes(set) => Self::Recipes {
                recipe1: set.recipe1.into(),
                recipe2: set.recipe2.into(),
                recipe3: set.recipe3.into(),
            },
            RecipeOutcome::ParseFailure {
                error,
                raw_arguments,
            } => Self::ParseFailure {
                error,
                raw_arguments,
            },
            RecipeOutcome::Fallback(fallback_content) => Self::Fallback { fallback_content },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientBody {
    pub name: String,
    pub quantity: String,
}

impl From<ExtractedIngredient> for IngredientBody {
    fn from(ingredient: ExtractedIngredient) -> Self {
        Self {
            name: ingredient.name,
            quantity: ingredient.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ExtractionResponse {
    /// Empty when nothing edible was recognised.
    Ingredients { ingredients: Vec<IngredientBody> },
    ParseFailure {
        error: String,
        raw_arguments: String,
    },
    Fallback {
        fallback_content: String,
    },
}

impl From<IngredientOutcome> for ExtractionResponse {
    fn from(outcome: IngredientOutcome) -> Self {
        match outcome {
            IngredientOutcome::Ingredients(found) => Self::Ingredients {
                ingredients: found.into_iter().map(IngredientBody::from).collect(),
            },
            IngredientOutcome::NoneDetected => Self::Ingredients {
                ingredients: Vec::new(),
            },
            IngredientOutcome::ParseFailure {
                error,
                raw_arguments,
            } => Self::ParseFailure {
                error,
                raw_arguments,
            },
            IngredientOutcome::Fallback(fallback_content) => Self::Fallback { fallback_content },
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Suggest three recipes from the caller's fridge, honoring the given preferences.
#[utoipa::path(
    post,
    path = "/fridge/generate_recipes",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Recipes, a parse diagnostic, or fallback text", body = GenerationResponse),
        (status = 400, description = "The fridge is empty"),
        (status = 502, description = "The model call failed")
    ),
    security(("bearer" = []))
)]
pub async fn generate_recipes(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerationResponse>, HttpError> {
    let outcome = state
        .recipes
        .generate(&identity.user_id, req.preferences.as_ref())
        .await?;
    Ok(Json(outcome.into()))
}

/// Same as the POST form, without preferences.
#[utoipa::path(
    get,
    path = "/fridge/generate_recipes",
    responses(
        (status = 200, description = "Recipes, a parse diagnostic, or fallback text", body = GenerationResponse),
        (status = 400, description = "The fridge is empty"),
        (status = 502, description = "The model call failed")
    ),
    security(("bearer" = []))
)]
pub async fn generate_recipes_default(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<GenerationResponse>, HttpError> {
    let outcome = state.recipes.generate(&identity.user_id, None).await?;
    Ok(Json(outcome.into()))
}

/// Detect ingredients in an uploaded photo.
///
/// Expects a multipart/form-data body with the picture in the `image_file` part.
#[utoipa::path(
    post,
    path = "/fridge/load_from_image",
    request_body(content_type = "multipart/form-data", description = "The photo, in the `image_file` part."),
    responses(
        (status = 200, description = "Detected ingredients, a parse diagnostic, or fallback text", body = ExtractionResponse),
        (status = 400, description = "Missing, empty or non-image upload"),
        (status = 502, description = "The model call failed")
    ),
    security(("bearer" = []))
)]
pub async fn load_from_image(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResponse>, HttpError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        HttpError::bad_request(format!("Failed to read multipart data: {e}"))
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        validate_upload(field.file_name(), field.content_type())?;
        let data = field.bytes().await.map_err(|e| {
            HttpError::bad_request(format!("Failed to read uploaded file: {e}"))
        })?;
        info!(user_id = %identity.user_id, size = data.len(), "image received");

        let outcome = state.extractor.extract(data.to_vec()).await?;
        return Ok(Json(outcome.into()));
    }

    Err(HttpError::bad_request("No image file provided."))
}

/// The upload must carry an image extension and an `image/*` content type.
fn validate_upload(file_name: Option<&str>, content_type: Option<&str>) -> Result<(), HttpError> {
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    if !extension.is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str())) {
        let supported: Vec<String> = ALLOWED_EXTENSIONS.iter().map(|e| format!(".{e}")).collect();
        return Err(HttpError::bad_request(format!(
            "Unsupported file format. Supported formats: {}",
            supported.join(", ")
        )));
    }

    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Err(HttpError::bad_request(
            "The uploaded file does not appear to be an image.",
        ));
    }
    Ok(())
}
