//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! storage ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fridge_core::domain::{FavoriteRecipe, InventoryRecord, UserProfile};
use fridge_core::ports::{FavoritesStore, InventoryStore, PortError, PortResult, ProfileStore};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every storage port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// SQLSTATE raised when a BIGINT sum overflows.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

fn db_error(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Friendships are stored once per unordered pair, smallest id first.
///
/// Byte order, matching the `"C"` collation the friendship columns are declared with.
fn ordered<'a>(user_a: &'a str, user_b: &'a str) -> (&'a str, &'a str) {
    if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct FridgeItemRecord {
    id: Uuid,
    user_id: String,
    name: String,
    quantity: i64,
}
impl FridgeItemRecord {
    fn to_domain(self) -> InventoryRecord {
        InventoryRecord {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            quantity: self.quantity,
        }
    }
}

#[derive(FromRow)]
struct FavoriteRecord {
    id: Uuid,
    user_id: String,
    title: String,
    description: String,
}
impl FavoriteRecord {
    fn to_domain(self) -> FavoriteRecipe {
        FavoriteRecipe {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    user_id: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}
impl ProfileRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            picture: self.picture,
            updated_at: self.updated_at,
        }
    }
}

//=========================================================================================
// `InventoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl InventoryStore for DbAdapter {
    async fn increment(&self, user_id: &str, name: &str, by: i64) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO fridge_items (id, user_id, name, quantity) VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, name)
             DO UPDATE SET quantity = fridge_items.quantity + EXCLUDED.quantity
             RETURNING quantity",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
                PortError::OutOfRange(format!("quantity of {name}"))
            }
            _ => db_error(e),
        })
    }

    async fn get(&self, user_id: &str, name: &str) -> PortResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, FridgeItemRecord>(
            "SELECT id, user_id, name, quantity FROM fridge_items WHERE user_id = $1 AND name = $2",
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.map(FridgeItemRecord::to_domain))
    }

    async fn compare_and_set(
        &self,
        user_id: &str,
        name: &str,
        expected: i64,
        new: i64,
    ) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE fridge_items SET quantity = $4
             WHERE user_id = $1 AND name = $2 AND quantity = $3",
        )
        .bind(user_id)
        .bind(name)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_existing(&self, user_id: &str, name: &str, quantity: i64) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE fridge_items SET quantity = $3 WHERE user_id = $1 AND name = $2",
        )
        .bind(user_id)
        .bind(name)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, user_id: &str, name: &str, expected: Option<i64>) -> PortResult<bool> {
        let result = sqlx::query(
            "DELETE FROM fridge_items
             WHERE user_id = $1 AND name = $2 AND ($3::BIGINT IS NULL OR quantity = $3)",
        )
        .bind(user_id)
        .bind(name)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, user_id: &str) -> PortResult<Vec<InventoryRecord>> {
        let records = sqlx::query_as::<_, FridgeItemRecord>(
            "SELECT id, user_id, name, quantity FROM fridge_items WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(records.into_iter().map(FridgeItemRecord::to_domain).collect())
    }
}

//=========================================================================================
// `FavoritesStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl FavoritesStore for DbAdapter {
    async fn upsert_favorite(
        &self,
        user_id: &str,
        title: &str,
        description: &str,
    ) -> PortResult<FavoriteRecipe> {
        let record = sqlx::query_as::<_, FavoriteRecord>(
            "INSERT INTO favorite_recipes (id, user_id, title, description) VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, title) DO UPDATE SET description = EXCLUDED.description
             RETURNING id, user_id, title, description",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain())
    }

    async fn delete_favorite(&self, user_id: &str, title: &str) -> PortResult<bool> {
        let result =
            sqlx::query("DELETE FROM favorite_recipes WHERE user_id = $1 AND title = $2")
                .bind(user_id)
                .bind(title)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: &str) -> PortResult<Vec<FavoriteRecipe>> {
        let records = sqlx::query_as::<_, FavoriteRecord>(
            "SELECT id, user_id, title, description FROM favorite_recipes
             WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(records.into_iter().map(FavoriteRecord::to_domain).collect())
    }
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for DbAdapter {
    async fn get_profile(&self, user_id: &str) -> PortResult<Option<UserProfile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, name, email, picture, updated_at FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.map(ProfileRecord::to_domain))
    }

    async fn find_profile_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, name, email, picture, updated_at FROM user_profiles
             WHERE email = $1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.map(ProfileRecord::to_domain))
    }

    async fn upsert_profile(&self, profile: UserProfile) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "INSERT INTO user_profiles (user_id, name, email, picture, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id) DO UPDATE SET
                 name = EXCLUDED.name,
                 email = EXCLUDED.email,
                 picture = EXCLUDED.picture,
                 updated_at = EXCLUDED.updated_at
             RETURNING user_id, name, email, picture, updated_at",
        )
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.picture)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain())
    }

    async fn add_friendship(&self, user_a: &str, user_b: &str) -> PortResult<()> {
        let (low, high) = ordered(user_a, user_b);
        sqlx::query(
            "INSERT INTO friendships (user_a, user_b) VALUES ($1, $2)
             ON CONFLICT (user_a, user_b) DO NOTHING",
        )
        .bind(low)
        .bind(high)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn remove_friendship(&self, user_a: &str, user_b: &str) -> PortResult<bool> {
        let (low, high) = ordered(user_a, user_b);
        let result = sqlx::query("DELETE FROM friendships WHERE user_a = $1 AND user_b = $2")
            .bind(low)
            .bind(high)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn friend_ids(&self, user_id: &str) -> PortResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT CASE WHEN user_a = $1 THEN user_b ELSE user_a END
             FROM friendships WHERE user_a = $1 OR user_b = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }
}
