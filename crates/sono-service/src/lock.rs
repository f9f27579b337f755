//! Per-storage serialization of structural mutations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use sono_core::types::UserId;

/// One async mutex per user storage.
///
/// Every structural mutation inside a storage holds its guard for the
/// whole filesystem change plus metadata write. Reads never lock.
#[derive(Debug, Default)]
pub struct StorageLocks {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl StorageLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the storage of `user_id`.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(user_id).or_default().value().clone();
        lock.lock_owned().await
    }

    /// Drops the entry of `user_id` unless another task still holds or
    /// waits on its mutex.
    pub fn release(&self, user_id: UserId) {
        self.locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_storage_is_serialized() {
        let locks = Arc::new(StorageLocks::new());
        let user = UserId::new();

        let guard = locks.acquire(user).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(user).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_release_drops_idle_entries_only() {
        let locks = StorageLocks::new();
        let user = UserId::new();

        let guard = locks.acquire(user).await;
        locks.release(user);
        assert!(locks.locks.contains_key(&user));

        drop(guard);
        locks.release(user);
        assert!(locks.locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_storages_do_not_block() {
        let locks = StorageLocks::new();
        let _first = locks.acquire(UserId::new()).await;
        let _second = locks.acquire(UserId::new()).await;
    }
}
