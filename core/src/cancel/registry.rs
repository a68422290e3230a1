use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use super::OperationKey;

/// Cancel latch of one in-flight operation.
///
/// Clones share the latch. Two handles are the same handle when
/// [`CancellationHandle::same_as`] holds.
#[derive(Clone, Debug)]
pub struct CancellationHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    key: OperationKey,
    token: CancellationToken,
}

impl CancellationHandle {
    fn new(key: OperationKey) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                key,
                token: CancellationToken::new(),
            }),
        }
    }

    /// Handle that is not tracked by any registry. Useful for one-shot
    /// invocations and tests.
    pub fn detached(key: impl Into<OperationKey>) -> Self {
        Self::new(key.into())
    }

    pub fn key(&self) -> &OperationKey {
        &self.inner.key
    }

    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Resolves once the handle is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    pub fn same_as(&self, other: &CancellationHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

struct Entry {
    handle: CancellationHandle,
    holders: usize,
}

/// Maps operation keys to their live cancellation handle.
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    entries: Arc<Mutex<HashMap<OperationKey, Entry>>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OperationKey, Entry>> {
        // Map updates cannot leave the map half-written, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the live handle for `key`, creating it when none exists.
    pub fn acquire(&self, key: &OperationKey) -> CancellationHandle {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(key = %key, "cancellation handle created");
            Entry {
                handle: CancellationHandle::new(key.clone()),
                holders: 0,
            }
        });
        entry.holders += 1;
        if entry.holders > 1 {
            tracing::debug!(key = %key, holders = entry.holders, "cancellation handle reused");
        }
        entry.handle.clone()
    }

    /// Acquires the handle for `key` and ties its release to the returned guard.
    pub fn lease(&self, key: &OperationKey) -> RegistryLease {
        let handle = self.acquire(key);
        RegistryLease {
            registry: self.clone(),
            handle,
        }
    }

    /// Signals the handle registered for `key`. Returns whether one existed.
    pub fn cancel(&self, key: &OperationKey) -> bool {
        let handle = self.lock().get(key).map(|e| e.handle.clone());
        match handle {
            Some(handle) => {
                tracing::info!(key = %key, "cancellation requested");
                handle.cancel();
                true
            }
            None => {
                tracing::debug!(key = %key, "cancel for unknown operation ignored");
                false
            }
        }
    }

    /// Signals every registered handle and returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let handles: Vec<CancellationHandle> =
            self.lock().values().map(|e| e.handle.clone()).collect();
        for handle in &handles {
            handle.cancel();
        }
        if !handles.is_empty() {
            tracing::info!(count = handles.len(), "cancelled all operations");
        }
        handles.len()
    }

    /// Removes the mapping for `key` regardless of holders.
    pub fn clear(&self, key: &OperationKey) {
        if self.lock().remove(key).is_some() {
            tracing::debug!(key = %key, "cancellation handle cleared");
        }
    }

    /// Drops one holder of `handle`; the entry goes away with its last holder.
    pub fn release(&self, handle: &CancellationHandle) {
        let mut entries = self.lock();
        let key = handle.key();
        let remove = match entries.get_mut(key) {
            Some(entry) if entry.handle.same_as(handle) => {
                entry.holders = entry.holders.saturating_sub(1);
                entry.holders == 0
            }
            // Already cleared, or replaced by a newer lifecycle.
            _ => false,
        };
        if remove {
            entries.remove(key);
            tracing::debug!(key = %key, "cancellation handle cleared");
        }
    }

    pub fn contains(&self, key: &OperationKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<OperationKey> {
        let mut keys: Vec<OperationKey> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Holds a registry handle for the duration of one operation.
pub struct RegistryLease {
    registry: CancellationRegistry,
    handle: CancellationHandle,
}

impl RegistryLease {
    pub fn handle(&self) -> &CancellationHandle {
        &self.handle
    }

    pub fn key(&self) -> &OperationKey {
        self.handle.key()
    }
}

impl Drop for RegistryLease {
    fn drop(&mut self) {
        self.registry.release(&self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn concurrent_acquire_yields_one_handle() {
        let registry = CancellationRegistry::new();
        let key = OperationKey::new("/p:build");
        let barrier = Arc::new(Barrier::new(8));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let key = key.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.acquire(&key)
                })
            })
            .collect();

        let handles: Vec<CancellationHandle> =
            threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert!(handles.iter().all(|h| h.same_as(&handles[0])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn cancel_unknown_key_is_a_noop() {
        let registry = CancellationRegistry::new();
        assert!(!registry.cancel(&OperationKey::new("missing")));
        assert!(registry.is_empty());
    }

    #[test]
    fn cancel_signals_the_registered_handle() {
        let registry = CancellationRegistry::new();
        let key = OperationKey::new("k");
        let handle = registry.acquire(&key);
        assert!(!handle.is_cancelled());
        assert!(registry.cancel(&key));
        assert!(handle.is_cancelled());
    }

    #[test]
    fn lease_drop_removes_entry() {
        let registry = CancellationRegistry::new();
        let key = OperationKey::new("k");
        {
            let lease = registry.lease(&key);
            assert_eq!(lease.key(), &key);
            assert!(registry.contains(&key));
        }
        assert!(!registry.contains(&key));
    }

    #[test]
    fn reused_handle_stays_until_last_holder_releases() {
        let registry = CancellationRegistry::new();
        let key = OperationKey::new("k");
        let first = registry.lease(&key);
        let second = registry.lease(&key);
        assert!(first.handle().same_as(second.handle()));

        drop(first);
        assert!(registry.contains(&key));
        drop(second);
        assert!(!registry.contains(&key));
    }

    #[test]
    fn lease_during_cancelled_shutdown_joins_the_cancelled_handle() {
        let registry = CancellationRegistry::new();
        let key = OperationKey::new("k");
        let running = registry.lease(&key);
        assert!(registry.cancel(&key));

        let late = registry.lease(&key);
        assert!(late.handle().same_as(running.handle()));
        assert!(late.handle().is_cancelled());

        drop(running);
        drop(late);
        let next = registry.lease(&key);
        assert!(!next.handle().is_cancelled());
    }

    #[test]
    fn stale_release_does_not_remove_new_lifecycle() {
        let registry = CancellationRegistry::new();
        let key = OperationKey::new("k");
        let old = registry.lease(&key);
        registry.clear(&key);
        let fresh = registry.lease(&key);
        assert!(!old.handle().same_as(fresh.handle()));

        drop(old);
        assert!(registry.contains(&key));
        drop(fresh);
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let registry = CancellationRegistry::new();
        let key = OperationKey::new("k");
        registry.acquire(&key);
        registry.clear(&key);
        registry.clear(&key);
        assert!(registry.is_empty());
    }

    #[test]
    fn cancel_all_signals_every_handle() {
        let registry = CancellationRegistry::new();
        let a = registry.acquire(&OperationKey::new("a"));
        let b = registry.acquire(&OperationKey::new("b"));
        assert_eq!(registry.cancel_all(), 2);
        assert!(a.is_cancelled() && b.is_cancelled());
        assert_eq!(registry.keys(), vec![OperationKey::new("a"), OperationKey::new("b")]);
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let handle = CancellationHandle::detached("k");
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        handle.cancel();
        task.await.unwrap();
    }
}
