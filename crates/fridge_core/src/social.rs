//! crates/fridge_core/src/social.rs
//!
//! Favorite recipes, user profiles and the friend graph.

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::domain::{FavoriteRecipe, FriendSummary, Identity, UserProfile};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{FavoritesStore, ProfileStore};

#[derive(Clone)]
pub struct SocialService {
    favorites: Arc<dyn FavoritesStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl SocialService {
    pub fn new(favorites: Arc<dyn FavoritesStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            favorites,
            profiles,
        }
    }

    //=====================================================================================
    // Favorites
    //=====================================================================================

    pub async fn list_favorites(&self, user_id: &str) -> ServiceResult<Vec<FavoriteRecipe>> {
        let mut favorites = self.favorites.list_favorites(user_id).await?;
        favorites.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(favorites)
    }

    /// Stars or unstars a recipe. Starring the same title twice keeps one entry
    /// with the latest description.
    #[instrument(skip(self, description))]
    pub async fn set_favorite(
        &self,
        user_id: &str,
        title: &str,
        description: &str,
        is_favorited: bool,
    ) -> ServiceResult<String> {
        let title = favorite_title(title)?;
        if is_favorited {
            self.favorites
                .upsert_favorite(user_id, title, description)
                .await?;
            Ok(format!("Added {title} to favorites"))
        } else {
            self.favorites.delete_favorite(user_id, title).await?;
            Ok(format!("Removed {title} from favorites"))
        }
    }

    pub async fn remove_favorite(&self, user_id: &str, title: &str) -> ServiceResult<String> {
        let title = favorite_title(title)?;
        if !self.favorites.delete_favorite(user_id, title).await? {
            return Err(ServiceError::NotFound("Recipe not found".to_string()));
        }
        Ok(format!("Removed {title} from favorites"))
    }

    /// A friend's favorites. Only readable by someone on their friend list.
    pub async fn friend_favorites(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> ServiceResult<Vec<FavoriteRecipe>> {
        let friends = self.profiles.friend_ids(user_id).await?;
        if !friends.iter().any(|id| id == friend_id) {
            return Err(ServiceError::NotFound("Friend not found".to_string()));
        }
        self.list_favorites(friend_id).await
    }

    //=====================================================================================
    // Profile
    //=====================================================================================

    /// The stored profile, with token claims filling any field never stored.
    pub async fn profile(&self, identity: &Identity) -> ServiceResult<UserProfile> {
        let stored = self.profiles.get_profile(&identity.user_id).await?;
        Ok(merge_claims(identity, stored))
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn update_picture(
        &self,
        identity: &Identity,
        picture_url: &str,
    ) -> ServiceResult<UserProfile> {
        if picture_url.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Profile picture URL must not be empty.".to_string(),
            ));
        }

        // Name and email are refreshed from the token on every picture change.
        let stored = self.profiles.get_profile(&identity.user_id).await?;
        let mut profile = merge_claims(identity, stored);
        profile.name = identity.name.clone().or(profile.name);
        profile.email = identity.email.clone().or(profile.email);
        profile.picture = Some(picture_url.to_string());
        profile.updated_at = Some(Utc::now());

        Ok(self.profiles.upsert_profile(profile).await?)
    }

    //=====================================================================================
    // Friends
    //=====================================================================================

    #[instrument(skip(self))]
    pub async fn add_friend(&self, user_id: &str, email: &str) -> ServiceResult<FriendSummary> {
        let friend = self
            .profiles
            .find_profile_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Friend not found".to_string()))?;

        if friend.user_id == user_id {
            return Err(ServiceError::Validation(
                "You cannot add yourself as a friend.".to_string(),
            ));
        }

        self.profiles
            .add_friendship(user_id, &friend.user_id)
            .await?;
        info!(friend_id = %friend.user_id, "friend added");
        Ok(friend.into())
    }

    /// Idempotent: removing someone who is not a friend is not an error.
    pub async fn remove_friend(&self, user_id: &str, friend_id: &str) -> ServiceResult<bool> {
        let removed = self.profiles.remove_friendship(user_id, friend_id).await?;
        if removed {
            info!(%friend_id, "friend removed");
        }
        Ok(removed)
    }

    pub async fn list_friends(&self, user_id: &str) -> ServiceResult<Vec<FriendSummary>> {
        let ids = self.profiles.friend_ids(user_id).await?;
        let profiles = try_join_all(ids.iter().map(|id| self.profiles.get_profile(id))).await?;

        let mut friends: Vec<FriendSummary> = ids
            .into_iter()
            .zip(profiles)
            .map(|(id, profile)| match profile {
                Some(profile) => profile.into(),
                None => FriendSummary {
                    id,
                    name: String::new(),
                    email: String::new(),
                    picture: String::new(),
                },
            })
            .collect();
        friends.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(friends)
    }
}

fn merge_claims(identity: &Identity, stored: Option<UserProfile>) -> UserProfile {
    let stored = stored.unwrap_or_else(|| UserProfile {
        user_id: identity.user_id.clone(),
        name: None,
        email: None,
        picture: None,
        updated_at: None,
    });
    UserProfile {
        user_id: identity.user_id.clone(),
        name: stored.name.or_else(|| identity.name.clone()),
        email: stored.email.or_else(|| identity.email.clone()),
        picture: stored.picture.or_else(|| identity.picture.clone()),
        updated_at: stored.updated_at,
    }
}

/// Favorites are keyed by their trimmed title.
fn favorite_title(title: &str) -> ServiceResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation(
            "Recipe title must not be empty.".to_string(),
        ));
    }
    Ok(title)
}
