use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::slot::InstanceSlot;

/// Scoped token pinning a singleton alive.
///
/// Obtained only through [`Singleton::acquire`](crate::Singleton::acquire). While any guard
/// for a slot exists, a destroy request on that slot blocks. The guard is not `Clone`; moving
/// it moves the same unit of the guard count, and it is released exactly once when dropped
/// (or through [`AccessGuard::release`]).
///
/// Do not keep references obtained through the guard beyond its scope, and never hold a guard
/// across a teardown of its own vault on the same thread: teardown would wait forever.
///
/// # Examples
///
/// ```rust
/// use singleton_vault::{Singleton, Vault};
///
/// static COUNTER: Singleton<Vec<u32>> = Singleton::new(Vec::new);
///
/// let vault = Vault::new();
/// let guard = COUNTER.acquire_in(&vault).unwrap();
/// assert!(guard.is_empty());
/// ```
pub struct AccessGuard<T: Send + Sync + 'static> {
    /// Only `None` while the guard is being dropped.
    instance: Option<Arc<T>>,
    slot: Arc<InstanceSlot<T>>,
}

impl<T: Send + Sync + 'static> AccessGuard<T> {
    pub(crate) fn new(instance: Arc<T>, slot: Arc<InstanceSlot<T>>) -> Self {
        Self {
            instance: Some(instance),
            slot,
        }
    }

    fn instance(&self) -> &Arc<T> {
        match &self.instance {
            Some(instance) => instance,
            None => unreachable!("guard used after release"),
        }
    }

    /// Releases the guard now instead of at the end of the scope.
    pub fn release(self) {
        drop(self);
    }

    /// Raw pointer to the guarded instance, for identity comparisons.
    pub fn as_ptr(&self) -> *const T {
        Arc::as_ptr(self.instance())
    }

    /// Whether two guards point at the same instance.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(this.instance(), other.instance())
    }
}

impl<T: Send + Sync + 'static> Deref for AccessGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.instance()
    }
}

impl<T: Send + Sync + fmt::Debug + 'static> fmt::Debug for AccessGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessGuard").field(&**self).finish()
    }
}

impl<T: Send + Sync + 'static> Drop for AccessGuard<T> {
    fn drop(&mut self) {
        // The instance handle goes before `release` so the destroyer holds the last one.
        drop(self.instance.take());
        self.slot.release();
    }
}
