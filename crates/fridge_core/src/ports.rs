//! crates/fridge_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or model APIs.

use async_trait::async_trait;
use crate::domain::{FavoriteRecipe, InventoryRecord, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A write would push a stored value past what the store can represent.
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// The call to an external service failed outright (network, non-2xx, timeout).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The external service answered, but without the top-level structure we require.
    #[error("Unexpected response format: {0}")]
    UnexpectedResponseFormat(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports
//=========================================================================================

/// Durable `(user_id, item_name) -> quantity` mapping.
///
/// Every method is atomic on its single key. Implementations never store a
/// quantity of zero or below; callers delete instead.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Adds `by` to the stored quantity, creating the record if needed. Returns the new quantity.
    async fn increment(&self, user_id: &str, name: &str, by: i64) -> PortResult<i64>;

    async fn get(&self, user_id: &str, name: &str) -> PortResult<Option<InventoryRecord>>;

    /// Writes `new` only if the stored quantity is still `expected`.
    async fn compare_and_set(
        &self,
        user_id: &str,
        name: &str,
        expected: i64,
        new: i64,
    ) -> PortResult<bool>;

    /// Overwrites the quantity of an existing record. Returns `false` when there is none.
    async fn set_existing(&self, user_id: &str, name: &str, quantity: i64) -> PortResult<bool>;

    /// Deletes the record, optionally only if its quantity is still `expected`.
    async fn delete(&self, user_id: &str, name: &str, expected: Option<i64>) -> PortResult<bool>;

    async fn list(&self, user_id: &str) -> PortResult<Vec<InventoryRecord>>;
}

#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Inserts the favorite or replaces the description of the one with the same title.
    async fn upsert_favorite(
        &self,
        user_id: &str,
        title: &str,
        description: &str,
    ) -> PortResult<FavoriteRecipe>;

    async fn delete_favorite(&self, user_id: &str, title: &str) -> PortResult<bool>;

    async fn list_favorites(&self, user_id: &str) -> PortResult<Vec<FavoriteRecipe>>;
}

/// User profiles and the friendship graph.
///
/// Friendships are undirected: one edge per unordered pair of users.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> PortResult<Option<UserProfile>>;

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>>;

    async fn upsert_profile(&self, profile: UserProfile) -> PortResult<UserProfile>;

    async fn add_friendship(&self, user_a: &str, user_b: &str) -> PortResult<()>;

    async fn remove_friendship(&self, user_a: &str, user_b: &str) -> PortResult<bool>;

    /// Ids of everyone sharing an edge with `user_id`.
    async fn friend_ids(&self, user_id: &str) -> PortResult<Vec<String>>;
}

//=========================================================================================
// Language Model Port
//=========================================================================================

/// The schema the model is asked to fill through a function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Raw image bytes sent alongside the prompt. Encoding is the adapter's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
}

/// A self-contained chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub image: Option<ImageAttachment>,
    pub function: FunctionSpec,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// What came back from the model, before any interpretation of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    FunctionCall { name: String, arguments: String },
    Text(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends one request. Transport failures and replies without choices are errors;
    /// anything the model actually said is returned as a `ModelReply`.
    async fn complete(&self, request: ModelRequest) -> PortResult<ModelReply>;
}
