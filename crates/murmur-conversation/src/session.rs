//! Per-session conversation history.
//!
//! Sessions are created on first reference and live until the process exits
//! or they are explicitly cleared; there is no expiry.

use murmur_types::Turn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::OwnedMutexGuard;

/// Keyed store of committed conversation history.
///
/// Implementations must be safe to share across tasks. Callers that need a
/// read-modify-write section hold the matching [`SessionLocks`] guard.
pub trait SessionStore: Send + Sync {
    /// Committed turns for `key`; empty for unseen sessions.
    fn load(&self, key: &str) -> Vec<Turn>;

    /// Replaces the history for `key` with `turns`.
    fn commit(&self, key: &str, turns: Vec<Turn>);

    /// Drops a session. Returns whether it existed.
    fn remove(&self, key: &str) -> bool;

    /// Number of sessions currently held.
    fn session_count(&self) -> usize;
}

/// Process-memory [`SessionStore`].
///
/// Uses `std::sync::RwLock`: every acquisition is a short map operation that
/// never spans an `.await`.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<Turn>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Turn>>> {
        self.sessions.read().unwrap_or_else(|poisoned| {
            tracing::error!("session store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Turn>>> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            tracing::error!("session store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: &str) -> Vec<Turn> {
        self.read().get(key).cloned().unwrap_or_default()
    }

    fn commit(&self, key: &str, turns: Vec<Turn>) {
        self.write().insert(key.to_string(), turns);
    }

    fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    fn session_count(&self) -> usize {
        self.read().len()
    }
}

/// One async mutex per session key.
///
/// Holding a guard serializes the load, generate and commit steps of turns
/// on the same session while leaving other sessions untouched.
#[derive(Debug, Default, Clone)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    ///
    /// The key's entry is dropped from the table once the last guard or
    /// waiter for it is gone.
    pub async fn acquire(&self, key: &str) -> SessionGuard {
        let lock = {
            let mut locks = self.table();
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        SessionGuard {
            guard: Some(lock.lock_owned().await),
            key: key.to_string(),
            locks: self.clone(),
        }
    }

    /// Number of keys with a held or awaited lock.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| {
            tracing::error!("session lock table poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn release(&self, key: &str) {
        let mut locks = self.table();
        // Waiters hold a clone, so a count of one means the table is the last owner.
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }
}

/// Exclusive access to one session, released on drop.
#[derive(Debug)]
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: SessionLocks,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.key);
    }
}
