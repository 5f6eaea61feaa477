//! Per-(type, tag) storage for a lazily constructed singleton.
//!
//! A slot owns the instance, its lifecycle state and the number of outstanding
//! guards. Construction and destruction are serialized by a reentrant lifecycle
//! lock; state and guard count live behind a separate mutex paired with the
//! condition variable destroyers wait on.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex, ReentrantMutex};
use tracing::{debug, warn};

use crate::guard::AccessGuard;
use crate::vault::Vault;
use crate::{Result, SingletonError, VaultEvent};

/// Lifecycle state of a singleton slot.
///
/// ```text
/// Empty -> Initializing -> Live -> AboutToDestroy -> Destroying
/// ```
///
/// `Destroying` is terminal: a slot is never reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Located but never constructed.
    Empty,
    /// The factory is running.
    Initializing,
    /// The instance exists and guards can be handed out.
    Live,
    /// A destroy request is waiting for outstanding guards.
    AboutToDestroy,
    /// The instance has been dropped.
    Destroying,
}

/// Type-erased view of a slot, used by the vault for teardown sequencing.
pub(crate) trait SlotLifecycle: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Returns `true` if this call dropped a live instance.
    fn request_destroy(&self, vault: &Vault) -> bool;
}

#[derive(Debug)]
struct SlotCore<T> {
    state: SlotState,
    guards: usize,
    instance: Option<Arc<T>>,
}

#[derive(Debug)]
pub(crate) struct InstanceSlot<T> {
    type_name: &'static str,
    factory: fn() -> T,
    lifecycle: ReentrantMutex<()>,
    core: Mutex<SlotCore<T>>,
    unguarded: Condvar,
}

/// Puts the slot back to `Empty` if the factory unwinds.
struct ResetOnUnwind<'a, T>(&'a Mutex<SlotCore<T>>);

impl<T> Drop for ResetOnUnwind<'_, T> {
    fn drop(&mut self) {
        self.0.lock().state = SlotState::Empty;
    }
}

impl<T: Send + Sync + 'static> InstanceSlot<T> {
    pub(crate) fn new(type_name: &'static str, factory: fn() -> T) -> Self {
        Self {
            type_name,
            factory,
            lifecycle: ReentrantMutex::new(()),
            core: Mutex::new(SlotCore {
                state: SlotState::Empty,
                guards: 0,
                instance: None,
            }),
            unguarded: Condvar::new(),
        }
    }

    pub(crate) fn state(&self) -> SlotState {
        self.core.lock().state
    }

    pub(crate) fn guard_count(&self) -> usize {
        self.core.lock().guards
    }

    /// Hands out a guard, constructing the instance on first use.
    ///
    /// # Errors
    ///
    /// - [`SingletonError::RecursiveInitialization`] if called from inside this slot's factory
    /// - [`SingletonError::UseAfterDestroy`] if a destroy request is pending or done
    pub(crate) fn acquire(self: &Arc<Self>, vault: &Vault) -> Result<AccessGuard<T>> {
        // Live slots never touch the lifecycle lock.
        {
            let mut core = self.core.lock();
            match core.state {
                SlotState::Live => {
                    let guard = self.issue_guard(&mut core);
                    drop(core);
                    self.emit_acquire(vault, true);
                    return Ok(guard);
                }
                SlotState::AboutToDestroy | SlotState::Destroying => {
                    drop(core);
                    return Err(vault.report_use_after_destroy(self.type_name));
                }
                SlotState::Empty | SlotState::Initializing => {}
            }
        }

        let lifecycle = self.lifecycle.lock();
        let mut core = self.core.lock();
        match core.state {
            SlotState::Empty => core.state = SlotState::Initializing,
            SlotState::Live => {
                let guard = self.issue_guard(&mut core);
                drop(core);
                drop(lifecycle);
                self.emit_acquire(vault, true);
                return Ok(guard);
            }
            // Other threads wait on the lifecycle lock while a factory runs,
            // so only the constructing thread can observe this state here.
            SlotState::Initializing => {
                drop(core);
                vault.report_recursive_initialization(self.type_name);
                return Err(SingletonError::RecursiveInitialization {
                    type_name: self.type_name,
                });
            }
            SlotState::AboutToDestroy | SlotState::Destroying => {
                drop(core);
                drop(lifecycle);
                return Err(vault.report_use_after_destroy(self.type_name));
            }
        }
        drop(core);

        let instance = self.construct();

        let mut core = self.core.lock();
        core.instance = Some(Arc::new(instance));
        core.state = SlotState::Live;
        let guard = self.issue_guard(&mut core);
        drop(core);
        drop(lifecycle);

        // Callbacks below may acquire this slot again.
        debug!(type_name = self.type_name, "singleton constructed");
        vault.emit_event(&VaultEvent::Construct {
            type_name: self.type_name,
        });
        vault.register_constructed(Arc::clone(self) as Arc<dyn SlotLifecycle>);
        self.emit_acquire(vault, false);
        Ok(guard)
    }

    fn construct(&self) -> T {
        let reset = ResetOnUnwind(&self.core);
        let instance = (self.factory)();
        std::mem::forget(reset);
        instance
    }

    fn issue_guard(self: &Arc<Self>, core: &mut SlotCore<T>) -> AccessGuard<T> {
        let instance = match &core.instance {
            Some(instance) => Arc::clone(instance),
            None => unreachable!("live slot without an instance"),
        };
        core.guards += 1;
        AccessGuard::new(instance, Arc::clone(self))
    }

    fn emit_acquire(&self, vault: &Vault, found_live: bool) {
        vault.emit_event(&VaultEvent::Acquire {
            type_name: self.type_name,
            found_live,
        });
    }

    /// Gives back one unit of the guard count, waking destroyers on zero.
    pub(crate) fn release(&self) {
        let mut core = self.core.lock();
        debug_assert!(core.guards > 0, "guard released twice");
        core.guards = core.guards.saturating_sub(1);
        if core.guards == 0 {
            self.unguarded.notify_all();
        }
    }

    fn destroy(&self, vault: &Vault) -> bool {
        let lifecycle = self.lifecycle.lock();
        let mut core = self.core.lock();
        match core.state {
            SlotState::Live => {}
            SlotState::Empty => {
                core.state = SlotState::Destroying;
                return false;
            }
            SlotState::Initializing => {
                warn!(
                    type_name = self.type_name,
                    "destroy requested from inside the factory, ignoring"
                );
                return false;
            }
            SlotState::AboutToDestroy | SlotState::Destroying => return false,
        }

        core.state = SlotState::AboutToDestroy;
        if core.guards > 0 {
            debug!(
                type_name = self.type_name,
                guards = core.guards,
                "waiting for outstanding guards"
            );
        }
        while core.guards > 0 {
            self.unguarded.wait(&mut core);
        }
        let instance = core.instance.take();
        core.state = SlotState::Destroying;
        drop(core);

        // Guards drop their instance handle before releasing, so this is the last one.
        drop(instance);
        drop(lifecycle);
        debug!(type_name = self.type_name, "singleton destroyed");
        vault.emit_event(&VaultEvent::Destroy {
            type_name: self.type_name,
        });
        true
    }
}

impl<T: Send + Sync + 'static> SlotLifecycle for InstanceSlot<T> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn request_destroy(&self, vault: &Vault) -> bool {
        self.destroy(vault)
    }
}
