pub mod domain;
pub mod error;
pub mod inventory;
pub mod memory;
pub mod parser;
pub mod ports;
pub mod preferences;
pub mod recipes;
pub mod social;
pub mod vision;

pub use domain::{
    CookingTime, Difficulty, ExtractedIngredient, FavoriteRecipe, FriendSummary, Identity,
    IngredientOutcome, InventoryRecord, MutationOutcome, Recipe, RecipeOutcome, RecipePreferences,
    RecipeSet, RemoveAmount, UserProfile,
};
pub use error::{ServiceError, ServiceResult};
pub use inventory::InventoryService;
pub use memory::InMemoryStore;
pub use ports::{
    FavoritesStore, FunctionSpec, ImageAttachment, InventoryStore, LanguageModel, ModelReply,
    ModelRequest, PortError, PortResult, ProfileStore,
};
pub use recipes::RecipeGenerator;
pub use social::SocialService;
pub use vision::ImageIngredientExtractor;
