//! services/api/src/web/rest.rs
//!
//! Contains the public handlers and the master definition for the OpenAPI
//! specification.

use axum::Json;
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::{fridge, recipes, social};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        welcome,
        health,
        fridge::list_items,
        fridge::add_item,
        fridge::remove_item,
        fridge::update_quantity,
        fridge::suggestions,
        recipes::generate_recipes,
        recipes::generate_recipes_default,
        recipes::load_from_image,
        social::list_favorites,
        social::set_favorite,
        social::remove_favorite,
        social::profile,
        social::update_profile_picture,
        social::add_friend,
        social::remove_friend,
        social::list_friends,
        social::friend_favorites,
    ),
    components(
        schemas(
            WelcomeResponse,
            HealthResponse,
            fridge::ItemRequest,
            fridge::FridgeItem,
            fridge::MutationResponse,
            fridge::SuggestionsResponse,
            recipes::GenerateRequest,
            recipes::RecipeBody,
            recipes::GenerationResponse,
            recipes::IngredientBody,
            recipes::ExtractionResponse,
            social::MessageResponse,
            social::FavoriteBody,
            social::FavoriteRequest,
            social::RemoveFavoriteRequest,
            social::ProfileBody,
            social::UpdatePictureRequest,
            social::UpdateProfileResponse,
            social::AddFriendRequest,
            social::FriendBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Fridge API", description = "Fridge inventory, recipe suggestions and sharing favorites with friends.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Public handlers
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct WelcomeResponse {
    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/welcome",
    responses((status = 200, description = "Greeting", body = WelcomeResponse))
)]
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the fridge app!".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
