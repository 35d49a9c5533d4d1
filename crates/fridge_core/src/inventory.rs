//! crates/fridge_core/src/inventory.rs
//!
//! Business rules for adding, removing and updating fridge items.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::{InventoryRecord, MutationOutcome, RemoveAmount};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::InventoryStore;

/// How many times `remove` re-reads and retries after losing a compare-and-swap race.
pub const MAX_CAS_ATTEMPTS: usize = 5;

const NOT_FOUND: &str = "Item not found in the fridge.";

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Adds `quantity` of `name`, creating the item on first add.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: &str,
        name: &str,
        quantity: i64,
    ) -> ServiceResult<MutationOutcome> {
        validate_name(name)?;
        if quantity <= 0 {
            return Err(ServiceError::Validation(
                "Quantity must be greater than 0.".to_string(),
            ));
        }

        let stored = self.store.increment(user_id, name, quantity).await?;
        info!(stored, "item added");

        self.outcome(user_id, format!("{quantity} {name}(s) added to the fridge."))
            .await
    }

    /// Takes `amount` of `name` out of the fridge, deleting the item when nothing is left.
    ///
    /// The read and the conditional write race with other removals; on a lost race
    /// the whole decision is re-made from a fresh read.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: &str,
        name: &str,
        amount: RemoveAmount,
    ) -> ServiceResult<MutationOutcome> {
        validate_name(name)?;
        if let RemoveAmount::Amount(requested) = amount {
            if requested <= 0 {
                return Err(ServiceError::Validation(
                    "Quantity must be greater than 0.".to_string(),
                ));
            }
        }

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let record = self
                .store
                .get(user_id, name)
                .await?
                .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

            let (applied, message) = match amount {
                RemoveAmount::All => (
                    self.store.delete(user_id, name, None).await?,
                    format!("{name} completely removed."),
                ),
                RemoveAmount::Amount(requested) if record.quantity < requested => {
                    return Err(ServiceError::InsufficientQuantity {
                        name: name.to_string(),
                        available: record.quantity,
                        requested,
                    });
                }
                RemoveAmount::Amount(requested) => {
                    let remaining = record.quantity - requested;
                    if remaining > 0 {
                        (
                            self.store
                                .compare_and_set(user_id, name, record.quantity, remaining)
                                .await?,
                            format!("Decremented {name} by {requested}."),
                        )
                    } else {
                        (
                            self.store
                                .delete(user_id, name, Some(record.quantity))
                                .await?,
                            format!("{name} removed."),
                        )
                    }
                }
            };

            if applied {
                info!(attempt, "item removed");
                return self.outcome(user_id, message).await;
            }
            debug!(attempt, "quantity changed concurrently, retrying");
        }

        Err(ServiceError::Conflict(name.to_string()))
    }

    /// Sets the quantity of an existing item. Zero or less deletes it.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: &str,
        name: &str,
        quantity: i64,
    ) -> ServiceResult<MutationOutcome> {
        validate_name(name)?;
        if self.store.get(user_id, name).await?.is_none() {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }

        let (applied, message) = if quantity <= 0 {
            (
                self.store.delete(user_id, name, None).await?,
                format!("{name} removed from the fridge."),
            )
        } else {
            (
                self.store.set_existing(user_id, name, quantity).await?,
                format!("{name} quantity updated to {quantity}."),
            )
        };

        // Deleted between the existence check and the write.
        if !applied {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }
        info!("item quantity updated");
        self.outcome(user_id, message).await
    }

    /// Every item the user owns, in no particular order.
    pub async fn list_all(&self, user_id: &str) -> ServiceResult<Vec<InventoryRecord>> {
        Ok(self.store.list(user_id).await?)
    }

    /// `(name, quantity)` pairs sorted by name, so prompts built from it are stable.
    pub async fn snapshot(&self, user_id: &str) -> ServiceResult<Vec<(String, i64)>> {
        let mut items: Vec<(String, i64)> = self
            .list_all(user_id)
            .await?
            .into_iter()
            .map(|r| (r.name, r.quantity))
            .collect();
        items.sort();
        Ok(items)
    }

    /// One canned suggestion per item in the fridge.
    pub async fn suggestions(&self, user_id: &str) -> ServiceResult<Vec<String>> {
        let items = self.snapshot(user_id).await?;
        if items.is_empty() {
            return Err(ServiceError::EmptyFridge);
        }
        Ok(items
            .into_iter()
            .map(|(name, _)| format!("How about making something with {name}?"))
            .collect())
    }

    async fn outcome(&self, user_id: &str, message: String) -> ServiceResult<MutationOutcome> {
        Ok(MutationOutcome {
            message,
            items: self.list_all(user_id).await?,
        })
    }
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Item name must not be empty.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> (InventoryService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (InventoryService::new(store.clone()), store)
    }

    async fn quantity(store: &InMemoryStore, user: &str, name: &str) -> Option<i64> {
        store.get(user, name).await.unwrap().map(|r| r.quantity)
    }

    #[tokio::test]
    async fn add_creates_then_increments() {
        let (svc, store) = service();
        let first = svc.add("u1", "egg", 2).await.unwrap();
        assert_eq!(first.message, "2 egg(s) added to the fridge.");
        assert_eq!(first.items.len(), 1);

        svc.add("u1", "egg", 3).await.unwrap();
        assert_eq!(quantity(&store, "u1", "egg").await, Some(5));
    }

    #[tokio::test]
    async fn add_past_the_largest_quantity_is_rejected() {
        let (svc, store) = service();
        svc.add("u1", "X", i64::MAX).await.unwrap();

        let err = svc.add("u1", "X", 1).await.unwrap_err();
        assert_eq!(err, ServiceError::Validation("Quantity is too large.".to_string()));
        assert_eq!(quantity(&store, "u1", "X").await, Some(i64::MAX));
    }

    #[tokio::test]
    async fn add_rejects_non_positive_quantity() {
        let (svc, store) = service();
        let err = svc.add("u1", "egg", 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(quantity(&store, "u1", "egg").await, None);
    }

    #[tokio::test]
    async fn item_names_are_case_sensitive() {
        let (svc, _) = service();
        svc.add("u1", "Egg", 1).await.unwrap();
        let err = svc
            .remove("u1", "egg", RemoveAmount::Amount(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn add_then_remove_same_amount_leaves_no_record() {
        let (svc, store) = service();
        svc.add("u1", "X", 5).await.unwrap();
        let outcome = svc.remove("u1", "X", RemoveAmount::Amount(5)).await.unwrap();

        assert_eq!(outcome.message, "X removed.");
        assert!(outcome.items.is_empty());
        assert_eq!(quantity(&store, "u1", "X").await, None);
    }

    #[tokio::test]
    async fn remove_decrements_when_stock_remains() {
        let (svc, store) = service();
        svc.add("u1", "carrot", 3).await.unwrap();
        let outcome = svc
            .remove("u1", "carrot", RemoveAmount::Amount(1))
            .await
            .unwrap();

        assert_eq!(outcome.message, "Decremented carrot by 1.");
        assert_eq!(quantity(&store, "u1", "carrot").await, Some(2));
    }

    #[tokio::test]
    async fn remove_more_than_stored_fails_and_keeps_quantity() {
        let (svc, store) = service();
        svc.add("u1", "X", 2).await.unwrap();
        let err = svc
            .remove("u1", "X", RemoveAmount::Amount(3))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::InsufficientQuantity {
                name: "X".to_string(),
                available: 2,
                requested: 3,
            }
        );
        assert_eq!(quantity(&store, "u1", "X").await, Some(2));
    }

    #[tokio::test]
    async fn remove_all_ignores_stock_level() {
        let (svc, store) = service();
        svc.add("u1", "bacon", 7).await.unwrap();
        let outcome = svc.remove("u1", "bacon", RemoveAmount::All).await.unwrap();

        assert_eq!(outcome.message, "bacon completely removed.");
        assert_eq!(quantity(&store, "u1", "bacon").await, None);
    }

    #[tokio::test]
    async fn remove_missing_item_is_not_found() {
        let (svc, _) = service();
        let err = svc.remove("u1", "ghost", RemoveAmount::All).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound(NOT_FOUND.to_string()));
    }

    #[tokio::test]
    async fn update_sets_absolute_quantity() {
        let (svc, store) = service();
        svc.add("u1", "milk", 1).await.unwrap();
        let outcome = svc.update_quantity("u1", "milk", 9).await.unwrap();

        assert_eq!(outcome.message, "milk quantity updated to 9.");
        assert_eq!(quantity(&store, "u1", "milk").await, Some(9));
    }

    #[tokio::test]
    async fn update_to_zero_or_less_deletes() {
        let (svc, store) = service();
        svc.add("u1", "milk", 1).await.unwrap();
        let outcome = svc.update_quantity("u1", "milk", -4).await.unwrap();

        assert_eq!(outcome.message, "milk removed from the fridge.");
        assert_eq!(quantity(&store, "u1", "milk").await, None);
    }

    #[tokio::test]
    async fn update_missing_item_is_not_found() {
        let (svc, _) = service();
        let err = svc.update_quantity("u1", "milk", 3).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn users_do_not_see_each_other() {
        let (svc, _) = service();
        svc.add("u1", "X", 3).await.unwrap();
        assert!(svc.list_all("u2").await.unwrap().is_empty());

        let err = svc
            .remove("u2", "X", RemoveAmount::Amount(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn quantity_never_stored_as_zero_or_negative() {
        let (svc, store) = service();
        let script: [(bool, i64); 12] = [
            (true, 3),
            (false, 1),
            (false, 5),
            (false, 2),
            (true, 4),
            (false, 4),
            (false, 1),
            (true, 1),
            (true, 2),
            (false, 3),
            (false, 1),
            (true, 6),
        ];
        for (is_add, n) in script {
            let _ = if is_add {
                svc.add("u1", "X", n).await
            } else {
                svc.remove("u1", "X", RemoveAmount::Amount(n)).await
            };
            if let Some(q) = quantity(&store, "u1", "X").await {
                assert!(q > 0, "stored quantity {q} must be positive");
            }
        }
        assert_eq!(quantity(&store, "u1", "X").await, Some(6));
    }

    #[tokio::test]
    async fn suggestions_require_a_non_empty_fridge() {
        let (svc, _) = service();
        assert_eq!(svc.suggestions("u1").await.unwrap_err(), ServiceError::EmptyFridge);

        svc.add("u1", "tofu", 1).await.unwrap();
        assert_eq!(
            svc.suggestions("u1").await.unwrap(),
            vec!["How about making something with tofu?".to_string()]
        );
    }

    /// Delegates to an in-memory store, but lets another "client" take one item
    /// right before the first `n` compare-and-swaps.
    struct RacingStore {
        inner: InMemoryStore,
        races_left: AtomicUsize,
    }

    #[async_trait]
    impl InventoryStore for RacingStore {
        async fn increment(&self, user_id: &str, name: &str, by: i64) -> PortResult<i64> {
            self.inner.increment(user_id, name, by).await
        }
        async fn get(&self, user_id: &str, name: &str) -> PortResult<Option<InventoryRecord>> {
            self.inner.get(user_id, name).await
        }
        async fn compare_and_set(
            &self,
            user_id: &str,
            name: &str,
            expected: i64,
            new: i64,
        ) -> PortResult<bool> {
            if self
                .races_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                self.inner.increment(user_id, name, -1).await?;
            }
            self.inner.compare_and_set(user_id, name, expected, new).await
        }
        async fn set_existing(&self, user_id: &str, name: &str, q: i64) -> PortResult<bool> {
            self.inner.set_existing(user_id, name, q).await
        }
        async fn delete(&self, user_id: &str, name: &str, e: Option<i64>) -> PortResult<bool> {
            self.inner.delete(user_id, name, e).await
        }
        async fn list(&self, user_id: &str) -> PortResult<Vec<InventoryRecord>> {
            self.inner.list(user_id).await
        }
    }

    #[tokio::test]
    async fn remove_retries_after_losing_a_race() {
        let store = Arc::new(RacingStore {
            inner: InMemoryStore::new(),
            races_left: AtomicUsize::new(1),
        });
        let svc = InventoryService::new(store.clone());
        svc.add("u1", "egg", 10).await.unwrap();

        svc.remove("u1", "egg", RemoveAmount::Amount(2)).await.unwrap();
        // 10 - 1 (concurrent) - 2 (ours)
        assert_eq!(store.inner.get("u1", "egg").await.unwrap().unwrap().quantity, 7);
    }

    #[tokio::test]
    async fn remove_gives_up_after_repeated_races() {
        let store = Arc::new(RacingStore {
            inner: InMemoryStore::new(),
            races_left: AtomicUsize::new(MAX_CAS_ATTEMPTS),
        });
        let svc = InventoryService::new(store.clone());
        svc.add("u1", "egg", 100).await.unwrap();

        let err = svc
            .remove("u1", "egg", RemoveAmount::Amount(1))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Conflict("egg".to_string()));
    }
}
