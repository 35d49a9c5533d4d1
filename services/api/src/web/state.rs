//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use fridge_core::ports::{FavoritesStore, InventoryStore, LanguageModel, ProfileStore};
use fridge_core::{ImageIngredientExtractor, InventoryService, RecipeGenerator, SocialService};

use crate::config::Config;
use crate::web::auth::JwtKeys;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: JwtKeys,
    pub inventory: InventoryService,
    pub recipes: RecipeGenerator,
    pub extractor: ImageIngredientExtractor,
    pub social: SocialService,
}

impl AppState {
    /// Wires the core services onto the given store and model adapters.
    pub fn new<S>(
        config: Arc<Config>,
        store: Arc<S>,
        recipe_model: Arc<dyn LanguageModel>,
        vision_model: Arc<dyn LanguageModel>,
    ) -> Self
    where
        S: InventoryStore + FavoritesStore + ProfileStore + 'static,
    {
        let inventory = InventoryService::new(store.clone());
        Self {
            jwt: JwtKeys::from_secret(&config.jwt_secret),
            recipes: RecipeGenerator::new(inventory.clone(), recipe_model),
            extractor: ImageIngredientExtractor::new(vision_model),
            social: SocialService::new(store.clone(), store),
            inventory,
            config,
        }
    }
}
