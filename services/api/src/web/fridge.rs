//! services/api/src/web/fridge.rs
//!
//! Axum handlers for reading and mutating the caller's fridge.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use fridge_core::{Identity, InventoryRecord, MutationOutcome, RemoveAmount};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

/// Older clients ask for "remove everything" by sending this quantity.
pub const REMOVE_ALL_SENTINEL: i64 = 1_000_000_000;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemRequest {
    pub name: String,
    /// Amount to add or remove, or the new absolute quantity for an update.
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Remove the item entirely, whatever its quantity.
    #[serde(default)]
    pub all: bool,
}

impl ItemRequest {
    fn required_quantity(&self) -> Result<i64, HttpError> {
        self.quantity
            .ok_or_else(|| HttpError::bad_request("quantity is required."))
    }

    fn remove_amount(&self) -> Result<RemoveAmount, HttpError> {
        if self.all {
            return Ok(RemoveAmount::All);
        }
        Ok(match self.required_quantity()? {
            REMOVE_ALL_SENTINEL => RemoveAmount::All,
            n => RemoveAmount::Amount(n),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FridgeItem {
    pub id: Uuid,
    pub name: String,
    pub quantity: i64,
}

impl From<InventoryRecord> for FridgeItem {
    fn from(record: InventoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            quantity: record.quantity,
        }
    }
}

fn to_items(records: Vec<InventoryRecord>) -> Vec<FridgeItem> {
    let mut items: Vec<FridgeItem> = records.into_iter().map(FridgeItem::from).collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    items
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MutationResponse {
    pub message: String,
    pub all_items: Vec<FridgeItem>,
}

impl From<MutationOutcome> for MutationResponse {
    fn from(outcome: MutationOutcome) -> Self {
        Self {
            message: outcome.message,
            all_items: to_items(outcome.items),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List every item in the caller's fridge.
#[utoipa::path(
    get,
    path = "/fridge/get",
    responses(
        (status = 200, description = "The caller's fridge, sorted by name", body = [FridgeItem]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<FridgeItem>>, HttpError> {
    let records = state.inventory.list_all(&identity.user_id).await?;
    Ok(Json(to_items(records)))
}

/// Add an item, or increase its quantity if it is already in the fridge.
#[utoipa::path(
    post,
    path = "/fridge/add",
    request_body = ItemRequest,
    responses(
        (status = 200, description = "Item added", body = MutationResponse),
        (status = 400, description = "Empty name or non-positive quantity")
    ),
    security(("bearer" = []))
)]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<MutationResponse>, HttpError> {
    let quantity = req.required_quantity()?;
    let outcome = state
        .inventory
        .add(&identity.user_id, &req.name, quantity)
        .await?;
    Ok(Json(outcome.into()))
}

/// Remove some or all of an item.
#[utoipa::path(
    delete,
    path = "/fridge/remove",
    request_body = ItemRequest,
    responses(
        (status = 200, description = "Item removed or decremented", body = MutationResponse),
        (status = 400, description = "Not enough of the item in the fridge"),
        (status = 404, description = "Item not found in the fridge"),
        (status = 409, description = "Item kept changing concurrently")
    ),
    security(("bearer" = []))
)]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<MutationResponse>, HttpError> {
    let amount = req.remove_amount()?;
    let outcome = state
        .inventory
        .remove(&identity.user_id, &req.name, amount)
        .await?;
    Ok(Json(outcome.into()))
}

/// Set the quantity of an item. Zero or less removes it.
#[utoipa::path(
    put,
    path = "/fridge/update_quantity",
    request_body = ItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = MutationResponse),
        (status = 404, description = "Item not found in the fridge")
    ),
    security(("bearer" = []))
)]
pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<MutationResponse>, HttpError> {
    let quantity = req.required_quantity()?;
    let outcome = state
        .inventory
        .update_quantity(&identity.user_id, &req.name, quantity)
        .await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/fridge/suggestions",
    responses(
        (status = 200, description = "One suggestion per item", body = SuggestionsResponse),
        (status = 400, description = "The fridge is empty")
    ),
    security(("bearer" = []))
)]
pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<SuggestionsResponse>, HttpError> {
    let suggestions = state.inventory.suggestions(&identity.user_id).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}
