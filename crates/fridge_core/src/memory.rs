//! crates/fridge_core/src/memory.rs
//!
//! A process-local implementation of every storage port. Used when no database is
//! configured and as the backing store in tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{FavoriteRecipe, InventoryRecord, UserProfile};
use crate::ports::{FavoritesStore, InventoryStore, PortError, PortResult, ProfileStore};

type Key = (String, String);

fn key(user_id: &str, name: &str) -> Key {
    (user_id.to_string(), name.to_string())
}

/// Friendships are keyed by the unordered pair, smallest id first.
fn edge(user_a: &str, user_b: &str) -> Key {
    if user_a <= user_b {
        key(user_a, user_b)
    } else {
        key(user_b, user_a)
    }
}

#[derive(Default)]
struct Tables {
    items: HashMap<Key, InventoryRecord>,
    favorites: HashMap<Key, FavoriteRecipe>,
    profiles: HashMap<String, UserProfile>,
    friendships: HashSet<Key>,
}

/// All tables live behind one lock, so every operation is atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

//=========================================================================================
// `InventoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn increment(&self, user_id: &str, name: &str, by: i64) -> PortResult<i64> {
        let mut tables = self.tables.lock().await;
        let record = tables
            .items
            .entry(key(user_id, name))
            .or_insert_with(|| InventoryRecord {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                name: name.to_string(),
                quantity: 0,
            });
        record.quantity = record
            .quantity
            .checked_add(by)
            .ok_or_else(|| PortError::OutOfRange(format!("quantity of {name}")))?;
        Ok(record.quantity)
    }

    async fn get(&self, user_id: &str, name: &str) -> PortResult<Option<InventoryRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.items.get(&key(user_id, name)).cloned())
    }

    async fn compare_and_set(
        &self,
        user_id: &str,
        name: &str,
        expected: i64,
        new: i64,
    ) -> PortResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.items.get_mut(&key(user_id, name)) {
            Some(record) if record.quantity == expected => {
                record.quantity = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_existing(&self, user_id: &str, name: &str, quantity: i64) -> PortResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.items.get_mut(&key(user_id, name)) {
            Some(record) => {
                record.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: &str, name: &str, expected: Option<i64>) -> PortResult<bool> {
        let mut tables = self.tables.lock().await;
        let k = key(user_id, name);
        let matches = match (tables.items.get(&k), expected) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(record), Some(quantity)) => record.quantity == quantity,
        };
        if matches {
            tables.items.remove(&k);
        }
        Ok(matches)
    }

    async fn list(&self, user_id: &str) -> PortResult<Vec<InventoryRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

//=========================================================================================
// `FavoritesStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl FavoritesStore for InMemoryStore {
    async fn upsert_favorite(
        &self,
        user_id: &str,
        title: &str,
        description: &str,
    ) -> PortResult<FavoriteRecipe> {
        let mut tables = self.tables.lock().await;
        let favorite = tables
            .favorites
            .entry(key(user_id, title))
            .or_insert_with(|| FavoriteRecipe {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                title: title.to_string(),
                description: String::new(),
            });
        favorite.description = description.to_string();
        Ok(favorite.clone())
    }

    async fn delete_favorite(&self, user_id: &str, title: &str) -> PortResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(tables.favorites.remove(&key(user_id, title)).is_some())
    }

    async fn list_favorites(&self, user_id: &str) -> PortResult<Vec<FavoriteRecipe>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> PortResult<Option<UserProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables.profiles.get(user_id).cloned())
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .values()
            .find(|p| p.email.as_deref() == Some(email))
            .cloned())
    }

    async fn upsert_profile(&self, profile: UserProfile) -> PortResult<UserProfile> {
        let mut tables = self.tables.lock().await;
        tables
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn add_friendship(&self, user_a: &str, user_b: &str) -> PortResult<()> {
        let mut tables = self.tables.lock().await;
        tables.friendships.insert(edge(user_a, user_b));
        Ok(())
    }

    async fn remove_friendship(&self, user_a: &str, user_b: &str) -> PortResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(tables.friendships.remove(&edge(user_a, user_b)))
    }

    async fn friend_ids(&self, user_id: &str) -> PortResult<Vec<String>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .friendships
            .iter()
            .filter_map(|(a, b)| {
                if a == user_id {
                    Some(b.clone())
                } else if b == user_id {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect())
    }
}
