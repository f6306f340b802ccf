use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A sharded map from key to mutex, built on a `DashMap` the same way a
/// session cache would be, but repurposed into a per-key serialization
/// primitive rather than a state cache. Used both for the
/// per-conversation single-writer invariant and for per-tenant
/// ingestion serialization.
pub struct KeyedLockMap<K>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
{
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> KeyedLockMap<K>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquires the mutex for `key`, creating it on first use. The
    /// returned guard must be held for the duration of the critical
    /// section; dropping it releases the key for the next caller.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drops entries whose mutex has no other holder, bounding memory
    /// growth for conversations/tenants that have gone idle.
    pub fn sweep_idle(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for KeyedLockMap<K>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn serializes_same_key() {
        let map = Arc::new(KeyedLockMap::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..20 {
            let map = map.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = map.acquire("same-key".to_string()).await;
                let before = counter.load(Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.store(before + 1, Ordering::SeqCst);
            }));
        }

        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn sweep_removes_unheld_locks() {
        let map: KeyedLockMap<String> = KeyedLockMap::new();
        {
            let _guard = map.acquire("k".to_string()).await;
        }
        map.sweep_idle();
        assert!(map.is_empty());
    }
}
