//! Process-wide registry of singleton slots.
//!
//! The vault creates slots lazily, keyed by the `(type, tag)` pair, records the order in
//! which their instances were constructed and destroys them in reverse order on teardown.
//! It also owns the policy hooks and the trace callback.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::slot::{InstanceSlot, SlotLifecycle};
use crate::{Result, SingletonError, VaultEvent};

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `VaultEvent` for every lifecycle step.
/// It must be thread-safe because vaults are shared between threads.
pub type TraceCallback = dyn Fn(&VaultEvent) + Send + Sync + 'static;

/// Zero-argument policy hook invoked on protocol violations.
pub type PolicyHook = dyn Fn() + Send + Sync + 'static;

/// The process-wide vault used by handles declared with [`Singleton::new`](crate::Singleton::new).
static GLOBAL_VAULT: LazyLock<Vault> = LazyLock::new(Vault::new);

/// What happens when a second handle with a different factory claims an owned slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Report through the duplicated-singleton hook and hand out the first handle's instance.
    #[default]
    Share,
    /// Report through the hook, then fail the acquire with `DuplicatedSingleton`.
    Reject,
}

/// Construction-time settings of a [`Vault`].
///
/// # Examples
///
/// ```rust
/// use singleton_vault::{DuplicatePolicy, Vault, VaultConfig};
///
/// let vault = Vault::with_config(VaultConfig::new().duplicate_policy(DuplicatePolicy::Reject));
/// assert_eq!(vault.config().duplicate_policy, DuplicatePolicy::Reject);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultConfig {
    pub duplicate_policy: DuplicatePolicy,
}

impl VaultConfig {
    pub const fn new() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Share,
        }
    }

    #[must_use]
    pub const fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

struct SlotEntry {
    /// Address of the handle that created the slot.
    owner: usize,
    /// Address of that handle's factory.
    factory: usize,
    /// Later handles already reported as duplicates.
    reported: Vec<usize>,
    typed: Arc<dyn Any + Send + Sync>,
    lifecycle: Arc<dyn SlotLifecycle>,
}

#[derive(Default)]
struct Catalog {
    slots: HashMap<TypeId, SlotEntry>,
    closed: bool,
}

/// Registry of all singleton slots of one scope, ordered by construction time.
///
/// Most programs only use [`Vault::global`]. Separate vaults are useful for isolated
/// subsystems and tests; see also [`define_vault!`](crate::define_vault).
pub struct Vault {
    config: VaultConfig,
    catalog: Mutex<Catalog>,
    order: Mutex<Vec<Arc<dyn SlotLifecycle>>>,
    recursive_initialization_hook: Mutex<Option<Arc<PolicyHook>>>,
    duplicated_singleton_hook: Mutex<Option<Arc<PolicyHook>>>,
    trace: Mutex<Option<Arc<TraceCallback>>>,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("config", &self.config)
            .field("construction_order", &self.construction_order())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Dropping a vault tears it down, so its singletons go last constructed first.
impl Drop for Vault {
    fn drop(&mut self) {
        if !self.is_closed() {
            self.teardown_all();
        }
    }
}

impl Vault {
    pub fn new() -> Self {
        Self::with_config(VaultConfig::new())
    }

    pub fn with_config(config: VaultConfig) -> Self {
        Self {
            config,
            catalog: Mutex::new(Catalog::default()),
            order: Mutex::new(Vec::new()),
            recursive_initialization_hook: Mutex::new(None),
            duplicated_singleton_hook: Mutex::new(None),
            trace: Mutex::new(None),
        }
    }

    /// The process-wide vault, created on first use.
    pub fn global() -> &'static Vault {
        &GLOBAL_VAULT
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Set a tracing callback for vault operations.
    ///
    /// The callback is invoked without any vault or slot lock held, so it may use
    /// other singletons. Acquiring a singleton of this vault from the callback is
    /// allowed but produces further events.
    pub fn set_trace_callback(&self, callback: impl Fn(&VaultEvent) + Send + Sync + 'static) {
        *self.trace.lock() = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        *self.trace.lock() = None;
    }

    pub(crate) fn emit_event(&self, event: &VaultEvent) {
        let callback = self.trace.lock().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Policy hooks
    // -------------------------------------------------------------------------------------------------

    /// Install the hook run when a factory re-enters its own slot.
    ///
    /// The offending acquire fails either way; the hook decides whether to log,
    /// ignore or escalate (e.g. panic or abort).
    pub fn set_recursive_initialization_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self.recursive_initialization_hook.lock() = Some(Arc::new(handler));
    }

    pub fn clear_recursive_initialization_handler(&self) {
        *self.recursive_initialization_hook.lock() = None;
    }

    /// Install the hook run when a second handle with a different factory claims a slot.
    pub fn set_duplicated_singleton_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self.duplicated_singleton_hook.lock() = Some(Arc::new(handler));
    }

    pub fn clear_duplicated_singleton_handler(&self) {
        *self.duplicated_singleton_hook.lock() = None;
    }

    pub(crate) fn report_recursive_initialization(&self, type_name: &'static str) {
        self.emit_event(&VaultEvent::RecursiveInitialization { type_name });
        let hook = self.recursive_initialization_hook.lock().clone();
        match hook {
            Some(hook) => hook(),
            None => warn!(type_name, "recursive singleton initialization"),
        }
    }

    fn report_duplicated_singleton(&self, type_name: &'static str) {
        self.emit_event(&VaultEvent::DuplicatedSingleton { type_name });
        let hook = self.duplicated_singleton_hook.lock().clone();
        match hook {
            Some(hook) => hook(),
            None => warn!(type_name, "duplicated singleton declaration"),
        }
    }

    pub(crate) fn report_use_after_destroy(&self, type_name: &'static str) -> SingletonError {
        error!(type_name, "singleton used after destruction");
        self.emit_event(&VaultEvent::UseAfterDestroy { type_name });
        SingletonError::UseAfterDestroy { type_name }
    }

    // -------------------------------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------------------------------

    /// Find or create the slot for `(T, Tag)`.
    ///
    /// The first handle to get here owns the slot; its factory is the only one ever run.
    pub(crate) fn locate<T, Tag>(
        &self,
        owner: usize,
        factory: fn() -> T,
    ) -> Result<Arc<InstanceSlot<T>>>
    where
        T: Send + Sync + 'static,
        Tag: 'static,
    {
        let type_name = std::any::type_name::<T>();
        // Best-effort: function addresses may be merged or duplicated across codegen units.
        let factory_addr = factory as usize;

        let mut catalog = self.catalog.lock();
        let closed = catalog.closed;
        let (typed, created, duplicate) = match catalog.slots.get_mut(&TypeId::of::<(T, Tag)>()) {
            Some(entry) => {
                let duplicate = entry.owner != owner && entry.factory != factory_addr;
                let first_report = duplicate && !entry.reported.contains(&owner);
                if first_report {
                    entry.reported.push(owner);
                }
                (Arc::clone(&entry.typed), false, duplicate.then_some(first_report))
            }
            None if closed => {
                drop(catalog);
                return Err(self.report_use_after_destroy(type_name));
            }
            None => {
                let slot = Arc::new(InstanceSlot::new(type_name, factory));
                let typed: Arc<dyn Any + Send + Sync> = slot.clone();
                catalog.slots.insert(
                    TypeId::of::<(T, Tag)>(),
                    SlotEntry {
                        owner,
                        factory: factory_addr,
                        reported: Vec::new(),
                        typed: Arc::clone(&typed),
                        lifecycle: slot,
                    },
                );
                (typed, true, None)
            }
        };
        drop(catalog);

        if created {
            debug!(type_name, "singleton slot created");
            self.emit_event(&VaultEvent::Locate { type_name });
        }
        if let Some(first_report) = duplicate {
            if first_report {
                self.report_duplicated_singleton(type_name);
            }
            if self.config.duplicate_policy == DuplicatePolicy::Reject {
                return Err(SingletonError::DuplicatedSingleton { type_name });
            }
        }

        match typed.downcast::<InstanceSlot<T>>() {
            Ok(slot) => Ok(slot),
            Err(_) => unreachable!("slot key includes the slot type"),
        }
    }

    /// Find the slot for `(T, Tag)` without creating it.
    pub(crate) fn find<T, Tag>(&self) -> Option<Arc<InstanceSlot<T>>>
    where
        T: Send + Sync + 'static,
        Tag: 'static,
    {
        let typed = self
            .catalog
            .lock()
            .slots
            .get(&TypeId::of::<(T, Tag)>())
            .map(|entry| Arc::clone(&entry.typed))?;
        typed.downcast::<InstanceSlot<T>>().ok()
    }

    /// Append a freshly constructed slot to the teardown order.
    pub(crate) fn register_constructed(&self, slot: Arc<dyn SlotLifecycle>) {
        let type_name = slot.type_name();
        let position = {
            let mut order = self.order.lock();
            if order.iter().any(|known| Arc::ptr_eq(known, &slot)) {
                return;
            }
            order.push(slot);
            order.len() - 1
        };
        self.emit_event(&VaultEvent::Register {
            type_name,
            position,
        });
    }

    /// Type names of constructed singletons, in construction order.
    pub fn construction_order(&self) -> Vec<&'static str> {
        self.order.lock().iter().map(|slot| slot.type_name()).collect()
    }

    /// Number of singletons constructed in this vault.
    pub fn len(&self) -> usize {
        self.order.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`teardown_all`](Vault::teardown_all) has run.
    pub fn is_closed(&self) -> bool {
        self.catalog.lock().closed
    }

    /// Destroy every singleton of this vault, last constructed first.
    ///
    /// Each destruction waits until the guards of its slot are released. Afterwards the
    /// vault is closed: slots that were located but never constructed are marked destroyed
    /// and no new slot can be created. Returns the number of instances dropped.
    ///
    /// Calling this while the current thread holds a guard of this vault never returns.
    /// Dropping an open vault runs it implicitly.
    pub fn teardown_all(&self) -> usize {
        let located: Vec<Arc<dyn SlotLifecycle>> = {
            let mut catalog = self.catalog.lock();
            catalog.closed = true;
            catalog
                .slots
                .values()
                .map(|entry| Arc::clone(&entry.lifecycle))
                .collect()
        };
        let order: Vec<Arc<dyn SlotLifecycle>> = self.order.lock().clone();
        debug!(slots = order.len(), "tearing down vault");

        let mut count = 0;
        for slot in order.iter().rev() {
            if slot.request_destroy(self) {
                count += 1;
            }
        }
        // Slots that never finished construction, or were constructed during teardown.
        for slot in &located {
            if slot.request_destroy(self) {
                count += 1;
            }
        }

        self.emit_event(&VaultEvent::Teardown { count });
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Singleton, SlotState};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Primary;

    #[test]
    fn test_locate_creates_once() {
        let vault = Vault::new();
        let a = vault.locate::<u32, ()>(1, || 5).unwrap();
        let b = vault.locate::<u32, ()>(1, || 5).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.state(), SlotState::Empty);
        assert!(vault.is_empty());
    }

    #[test]
    fn test_tags_separate_slots() {
        let vault = Vault::new();
        let plain = vault.locate::<u32, ()>(1, || 1).unwrap();
        let tagged = vault.locate::<u32, Primary>(1, || 1).unwrap();
        assert!(!Arc::ptr_eq(&plain, &tagged));
        assert!(vault.find::<u32, Primary>().is_some());
        assert!(vault.find::<u64, Primary>().is_none());
    }

    #[test]
    fn test_register_is_deduplicated() {
        let vault = Vault::new();
        let slot = vault.locate::<u8, ()>(1, || 1).unwrap();
        vault.register_constructed(slot.clone());
        vault.register_constructed(slot);
        assert_eq!(vault.construction_order(), vec!["u8"]);
    }

    #[test]
    fn test_locate_after_teardown_fails() {
        let vault = Vault::new();
        assert_eq!(vault.teardown_all(), 0);
        assert!(vault.is_closed());
        assert_eq!(
            vault.locate::<i64, ()>(1, || 0).unwrap_err(),
            SingletonError::UseAfterDestroy { type_name: "i64" }
        );
    }

    #[test]
    fn test_teardown_marks_located_slots_terminal() {
        let vault = Vault::new();
        let slot = vault.locate::<i8, ()>(1, || -1).unwrap();
        vault.teardown_all();
        assert_eq!(slot.state(), SlotState::Destroying);
    }

    #[test]
    fn test_duplicate_reported_once_per_handle() {
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let vault = Vault::new();
        vault.set_duplicated_singleton_handler(|| {
            HITS.fetch_add(1, Ordering::SeqCst);
        });

        fn first() -> u16 {
            1
        }
        fn second() -> u16 {
            2
        }

        vault.locate::<u16, ()>(10, first).unwrap();
        vault.locate::<u16, ()>(20, second).unwrap();
        vault.locate::<u16, ()>(20, second).unwrap();
        assert_eq!(HITS.load(Ordering::SeqCst), 1);

        // Another handle sharing the owner's factory is not a duplicate.
        vault.locate::<u16, ()>(30, first).unwrap();
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reject_policy_fails_duplicate() {
        let vault =
            Vault::with_config(VaultConfig::new().duplicate_policy(DuplicatePolicy::Reject));
        vault.set_duplicated_singleton_handler(|| {});

        fn first() -> String {
            "first".into()
        }
        fn second() -> String {
            "second".into()
        }

        assert!(vault.locate::<String, ()>(1, first).is_ok());
        assert_eq!(
            vault.locate::<String, ()>(2, second).unwrap_err(),
            SingletonError::DuplicatedSingleton {
                type_name: "alloc::string::String"
            }
        );
    }

    #[test]
    fn test_trace_callback_sees_lifecycle() {
        let vault = Vault::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        vault.set_trace_callback(move |e| events_clone.lock().push(e.to_string()));

        let handle: Singleton<u32> = Singleton::new(|| 3);
        drop(handle.acquire_in(&vault).unwrap());
        vault.teardown_all();

        let captured = events.lock();
        assert_eq!(
            *captured,
            vec![
                "locate { type_name: u32 }",
                "construct { type_name: u32 }",
                "register { type_name: u32, position: 0 }",
                "acquire { type_name: u32, found_live: false }",
                "destroy { type_name: u32 }",
                "Tearing down the Vault (1 slots)",
            ]
        );
    }

    #[test]
    fn test_clear_trace_callback_stops_events() {
        let vault = Vault::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        vault.set_trace_callback(move |e| events_clone.lock().push(e.clone()));

        vault.locate::<u8, ()>(1, || 0).unwrap();
        vault.clear_trace_callback();
        vault.locate::<u16, ()>(1, || 0).unwrap();

        assert_eq!(
            *events.lock(),
            vec![VaultEvent::Locate { type_name: "u8" }]
        );
    }

    #[test]
    fn test_drop_tears_down_in_reverse_order() {
        static LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

        struct Alpha;
        impl Drop for Alpha {
            fn drop(&mut self) {
                LOG.lock().push("A");
            }
        }
        struct Beta;
        impl Drop for Beta {
            fn drop(&mut self) {
                LOG.lock().push("B");
            }
        }

        let alpha: Singleton<Alpha> = Singleton::new(|| Alpha);
        let beta: Singleton<Beta> = Singleton::new(|| Beta);

        let vault = Vault::new();
        drop(alpha.acquire_in(&vault).unwrap());
        drop(beta.acquire_in(&vault).unwrap());
        assert!(LOG.lock().is_empty());

        drop(vault);
        assert_eq!(*LOG.lock(), vec!["B", "A"]);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(Vault::global(), Vault::global()));
    }
}
