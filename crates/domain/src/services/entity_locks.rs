//! Per-entity mutual exclusion.
//!
//! Evaluation reads prior state, evaluates, and writes the new state. For a
//! single entity that sequence must not interleave with another ingest, or two
//! samples could both see the same `Inside` row and both fire an exit.
//! Different entities never share a lock.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::EntityId;

/// Number of tracked locks above which idle ones are pruned.
const PRUNE_THRESHOLD: usize = 1024;

type EntityLock = Arc<Mutex<()>>;

/// Lock registry keyed by entity id.
#[derive(Default)]
pub struct EntityLocks {
    locks: RwLock<HashMap<EntityId, EntityLock>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to an entity's evaluation scope.
    ///
    /// The scope lasts until the returned guard is dropped.
    pub async fn acquire(&self, entity_id: &EntityId) -> OwnedMutexGuard<()> {
        self.get_or_create(entity_id).lock_owned().await
    }

    fn get_or_create(&self, entity_id: &EntityId) -> EntityLock {
        {
            let locks = self.locks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(lock) = locks.get(entity_id) {
                return lock.clone();
            }
        }

        let mut locks = self.locks.write().unwrap_or_else(PoisonError::into_inner);

        // Another task may have inserted it while we waited for the write lock.
        if let Some(lock) = locks.get(entity_id) {
            return lock.clone();
        }

        if locks.len() >= PRUNE_THRESHOLD {
            // A count of one means only the registry holds it: nobody is
            // inside or waiting on that entity's scope.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        let lock = Arc::new(Mutex::new(()));
        locks.insert(entity_id.clone(), lock.clone());
        lock
    }

    /// Number of entities with a registered lock.
    pub fn len(&self) -> usize {
        self.locks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EntityLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityLocks")
            .field("active_locks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_entity_is_exclusive() {
        let locks = EntityLocks::new();
        let entity = EntityId::new("d1");

        let guard = locks.acquire(&entity).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&entity)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&entity)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_entities_do_not_block() {
        let locks = EntityLocks::new();
        let _d1 = locks.acquire(&EntityId::new("d1")).await;
        let d2 = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(&EntityId::new("d2")),
        )
        .await;
        assert!(d2.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let locks = EntityLocks::new();
        for i in 0..PRUNE_THRESHOLD {
            drop(locks.acquire(&EntityId::new(format!("e{i}"))).await);
        }
        assert_eq!(locks.len(), PRUNE_THRESHOLD);

        let held = locks.acquire(&EntityId::new("held")).await;
        assert_eq!(locks.len(), 1);
        drop(held);
    }
}
