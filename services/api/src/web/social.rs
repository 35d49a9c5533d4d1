//! services/api/src/web/social.rs
//!
//! Axum handlers for favorite recipes, the caller's profile and friends.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use fridge_core::{FavoriteRecipe, FriendSummary, Identity, UserProfile};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteBody {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

impl From<FavoriteRecipe> for FavoriteBody {
    fn from(favorite: FavoriteRecipe) -> Self {
        Self {
            id: favorite.id,
            title: favorite.title,
            description: favorite.description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FavoriteRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "isFavorited")]
    pub is_favorited: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFavoriteRequest {
    pub title: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl From<UserProfile> for ProfileBody {
    fn from(profile: UserProfile) -> Self {
        Self {
            name: profile.name,
            email: profile.email,
            picture: profile.picture,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePictureRequest {
    pub picture_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub message: String,
    pub profile: ProfileBody,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFriendRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FriendBody {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl From<FriendSummary> for FriendBody {
    fn from(friend: FriendSummary) -> Self {
        Self {
            id: friend.id,
            name: friend.name,
            email: friend.email,
            picture: friend.picture,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FriendQuery {
    pub friend_id: String,
}

fn favorites_body(favorites: Vec<FavoriteRecipe>) -> Json<Vec<FavoriteBody>> {
    Json(favorites.into_iter().map(FavoriteBody::from).collect())
}

fn is_plausible_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

//=========================================================================================
// Favorites
//=========================================================================================

#[utoipa::path(
    get,
    path = "/fridge/get_favorite_recipes",
    responses((status = 200, description = "The caller's favorite recipes", body = [FavoriteBody])),
    security(("bearer" = []))
)]
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<FavoriteBody>>, HttpError> {
    let favorites = state.social.list_favorites(&identity.user_id).await?;
    Ok(favorites_body(favorites))
}

/// Star a recipe when `isFavorited` is true, unstar it otherwise.
#[utoipa::path(
    post,
    path = "/recipes/favorite",
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "Favorite added or removed", body = MessageResponse),
        (status = 400, description = "Empty title")
    ),
    security(("bearer" = []))
)]
pub async fn set_favorite(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let message = state
        .social
        .set_favorite(
            &identity.user_id,
            &req.title,
            &req.description,
            req.is_favorited,
        )
        .await?;
    Ok(Json(MessageResponse { message }))
}

#[utoipa::path(
    post,
    path = "/fridge/remove_favorite_recipe",
    request_body = RemoveFavoriteRequest,
    responses(
        (status = 200, description = "Favorite removed", body = MessageResponse),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer" = []))
)]
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<RemoveFavoriteRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let message = state
        .social
        .remove_favorite(&identity.user_id, &req.title)
        .await?;
    Ok(Json(MessageResponse { message }))
}

//=========================================================================================
// Profile
//=========================================================================================

/// The caller's profile. Stored fields win over the token's claims.
#[utoipa::path(
    get,
    path = "/user/profile",
    responses((status = 200, description = "The caller's profile", body = ProfileBody)),
    security(("bearer" = []))
)]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ProfileBody>, HttpError> {
    let profile = state.social.profile(&identity).await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    post,
    path = "/user/update-profile-picture",
    request_body = UpdatePictureRequest,
    responses(
        (status = 200, description = "Picture updated", body = UpdateProfileResponse),
        (status = 400, description = "Empty picture URL")
    ),
    security(("bearer" = []))
)]
pub async fn update_profile_picture(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdatePictureRequest>,
) -> Result<Json<UpdateProfileResponse>, HttpError> {
    let profile = state
        .social
        .update_picture(&identity, &req.picture_url)
        .await?;
    Ok(Json(UpdateProfileResponse {
        success: true,
        message: "Profile picture updated successfully".to_string(),
        profile: profile.into(),
    }))
}

//=========================================================================================
// Friends
//=========================================================================================

#[utoipa::path(
    post,
    path = "/user/add_friend",
    request_body = AddFriendRequest,
    responses(
        (status = 200, description = "Friend added", body = FriendBody),
        (status = 400, description = "Malformed email, or the caller's own"),
        (status = 404, description = "No user with that email")
    ),
    security(("bearer" = []))
)]
pub async fn add_friend(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AddFriendRequest>,
) -> Result<Json<FriendBody>, HttpError> {
    let email = req.email.trim();
    if !is_plausible_email(email) {
        return Err(HttpError::bad_request("A valid email address is required."));
    }
    let friend = state.social.add_friend(&identity.user_id, email).await?;
    Ok(Json(friend.into()))
}

#[utoipa::path(
    delete,
    path = "/user/remove_friend",
    params(FriendQuery),
    responses((status = 200, description = "Friend removed", body = MessageResponse)),
    security(("bearer" = []))
)]
pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<FriendQuery>,
) -> Result<Json<MessageResponse>, HttpError> {
    state
        .social
        .remove_friend(&identity.user_id, &query.friend_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Friend removed".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/user/friends",
    responses((status = 200, description = "The caller's friends", body = [FriendBody])),
    security(("bearer" = []))
)]
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<FriendBody>>, HttpError> {
    let friends = state.social.list_friends(&identity.user_id).await?;
    Ok(Json(friends.into_iter().map(FriendBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/user/friend_favorites",
    params(FriendQuery),
    responses(
        (status = 200, description = "The friend's favorite recipes", body = [FavoriteBody]),
        (status = 404, description = "Not on the caller's friend list")
    ),
    security(("bearer" = []))
)]
pub async fn friend_favorites(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<FriendQuery>,
) -> Result<Json<Vec<FavoriteBody>>, HttpError> {
    let favorites = state
        .social
        .friend_favorites(&identity.user_id, &query.friend_id)
        .await?;
    Ok(favorites_body(favorites))
}
