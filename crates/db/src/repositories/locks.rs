//! Per-expense lock registry.
//!
//! Decisions on one expense are serialized; different expenses proceed in
//! parallel. Entries are dropped once no task holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed registry of async mutexes, one per expense under contention.
#[derive(Debug, Clone, Default)]
pub struct ExpenseLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ExpenseLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `expense_id`.
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn acquire(&self, expense_id: Uuid) -> ExpenseGuard {
        // Clone out of the map so no shard lock is held across the await.
        let lock = self
            .locks
            .entry(expense_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;

        ExpenseGuard {
            locks: Arc::clone(&self.locks),
            expense_id,
            guard: Some(guard),
        }
    }

    /// Number of expenses with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns `true` when no lock entries are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one expense.
#[derive(Debug)]
pub struct ExpenseGuard {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    expense_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ExpenseGuard {
    /// The expense this guard protects.
    #[must_use]
    pub fn expense_id(&self) -> Uuid {
        self.expense_id
    }
}

impl Drop for ExpenseGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the registry's own handle left: nobody is waiting.
        self.locks
            .remove_if(&self.expense_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_entry_removed_after_release() {
        let locks = ExpenseLocks::new();
        let expense_id = Uuid::new_v4();

        {
            let guard = locks.acquire(expense_id).await;
            assert_eq!(guard.expense_id(), expense_id);
            assert_eq!(locks.len(), 1);
        }

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_expense_is_serialized() {
        let locks = ExpenseLocks::new();
        let expense_id = Uuid::new_v4();

        let first = locks.acquire(expense_id).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(expense_id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        // Waiter keeps the entry alive.
        assert_eq!(locks.len(), 1);

        drop(first);
        contender.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_expenses_do_not_block() {
        let locks = ExpenseLocks::new();

        let _a = locks.acquire(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(Uuid::new_v4())).await;

        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
