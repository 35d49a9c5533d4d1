pub mod auth;
pub mod fridge;
pub mod middleware;
pub mod recipes;
pub mod rest;
pub mod social;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
pub use middleware::require_auth;
use rest::ApiDoc;
use state::AppState;

/// Uploads larger than this are rejected before reaching a handler.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the complete application router: public routes, the bearer-protected
/// API and the Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/welcome", get(rest::welcome))
        .route("/health", get(rest::health));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/fridge/get", get(fridge::list_items))
        .route("/fridge/add", post(fridge::add_item))
        .route("/fridge/remove", delete(fridge::remove_item))
        .route("/fridge/update_quantity", put(fridge::update_quantity))
        .route("/fridge/suggestions", get(fridge::suggestions))
        .route(
            "/fridge/generate_recipes",
            post(recipes::generate_recipes).get(recipes::generate_recipes_default),
        )
        .route("/fridge/load_from_image", post(recipes::load_from_image))
        .route("/fridge/get_favorite_recipes", get(social::list_favorites))
        .route("/recipes/favorite", post(social::set_favorite))
        .route(
            "/fridge/remove_favorite_recipe",
            post(social::remove_favorite),
        )
        .route("/user/profile", get(social::profile))
        .route(
            "/user/update-profile-picture",
            post(social::update_profile_picture),
        )
        .route("/user/add_friend", post(social::add_friend))
        .route("/user/remove_friend", delete(social::remove_friend))
        .route("/user/friends", get(social::list_friends))
        .route("/user/friend_favorites", get(social::friend_favorites))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// A single configured origin with credentials, or any origin when none is configured.
fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origin) = config.cors_origin.as_deref() else {
        return CorsLayer::permissive();
    };

    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]),
        Err(e) => {
            warn!(%origin, error = %e, "invalid CORS_ORIGIN, cross-origin requests are disabled");
            CorsLayer::new()
        }
    }
}
