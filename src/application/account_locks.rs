use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

const PRUNE_THRESHOLD: usize = 1024;

pub type AccountGuard = OwnedMutexGuard<()>;

/// Keyed async mutex: one exclusive scope per account id.
///
/// Every tier or quota mutation for an account runs while holding its guard, so two requests
/// for the same account never interleave inside this process. Idle slots are pruned once the
/// map grows past `PRUNE_THRESHOLD`.
#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, account_id: Uuid) -> AccountGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if slots.len() >= PRUNE_THRESHOLD {
                // A slot referenced only by the map has no holder and no waiter.
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            Arc::clone(slots.entry(account_id).or_default())
        };

        slot.lock_owned().await
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[tokio::test]
    async fn serializes_holders_of_the_same_account() {
        let locks = Arc::new(AccountLocks::new());
        let account_id = Uuid::new_v4();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(account_id).await;
                let now_inside = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now_inside, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_accounts_do_not_block_each_other() {
        let locks = AccountLocks::new();
        let _first = locks.lock(Uuid::new_v4()).await;

        let second = tokio::time::timeout(Duration::from_millis(100), locks.lock(Uuid::new_v4()))
            .await;

        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn prunes_idle_slots_past_threshold() {
        let locks = AccountLocks::new();
        for _ in 0..PRUNE_THRESHOLD {
            let _guard = locks.lock(Uuid::new_v4()).await;
        }
        assert_eq!(locks.slot_count(), PRUNE_THRESHOLD);

        let held = Uuid::new_v4();
        let _guard = locks.lock(held).await;

        assert_eq!(locks.slot_count(), 1);
    }
}
