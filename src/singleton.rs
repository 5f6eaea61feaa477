//! The public handle type.

use std::fmt;
use std::marker::PhantomData;

use crate::guard::AccessGuard;
use crate::slot::{SlotLifecycle, SlotState};
use crate::vault::Vault;
use crate::Result;

/// Tag used when a type has a single singleton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DefaultTag;

/// Stateless handle to a lazily constructed singleton of type `T`.
///
/// The handle only stores the factory and the vault accessor, so it can live in a `static`
/// with no ordering concerns: the instance itself is created inside the vault the first time
/// a guard is requested. Use different `Tag` types to keep several independent singletons of
/// the same `T`.
///
/// Handles are identified by their address for duplicate detection, so declare them as
/// `static` items rather than `const`. A second handle only counts as a duplicate when its
/// factory is a different function pointer too. Rust does not guarantee that function
/// addresses are unique or stable across codegen units: identical factories may be merged,
/// and one function may get several addresses. Duplicate reports are therefore best-effort
/// diagnostics, never a correctness guarantee.
///
/// # Examples
///
/// ```rust
/// use singleton_vault::Singleton;
///
/// struct Primary;
/// struct Replica;
///
/// static PRIMARY: Singleton<String, Primary> = Singleton::new(|| "primary".to_string());
/// static REPLICA: Singleton<String, Replica> = Singleton::new(|| "replica".to_string());
///
/// assert_eq!(PRIMARY.acquire().unwrap().as_str(), "primary");
/// assert_eq!(REPLICA.acquire().unwrap().as_str(), "replica");
/// ```
pub struct Singleton<T, Tag = DefaultTag> {
    factory: fn() -> T,
    vault: fn() -> &'static Vault,
    _tag: PhantomData<fn() -> Tag>,
}

impl<T, Tag> Singleton<T, Tag>
where
    T: Send + Sync + 'static,
    Tag: 'static,
{
    /// Declare a handle bound to the process-wide vault.
    pub const fn new(factory: fn() -> T) -> Self {
        Self::with_vault(factory, Vault::global)
    }

    /// Declare a handle bound to another `'static` vault.
    ///
    /// ```rust
    /// use singleton_vault::{define_vault, Singleton};
    ///
    /// define_vault!(plugins);
    ///
    /// static NAMES: Singleton<Vec<&'static str>> =
    ///     Singleton::with_vault(|| vec!["audio", "video"], plugins::vault);
    ///
    /// assert_eq!(NAMES.acquire().unwrap().len(), 2);
    /// assert_eq!(plugins::vault().len(), 1);
    /// ```
    pub const fn with_vault(factory: fn() -> T, vault: fn() -> &'static Vault) -> Self {
        Self {
            factory,
            vault,
            _tag: PhantomData,
        }
    }

    /// The vault this handle is bound to.
    pub fn vault(&self) -> &'static Vault {
        (self.vault)()
    }

    /// Get a guard on the instance, constructing it on first use.
    ///
    /// # Errors
    ///
    /// - [`SingletonError::RecursiveInitialization`](crate::SingletonError::RecursiveInitialization)
    ///   when called from inside the singleton's own factory
    /// - [`SingletonError::UseAfterDestroy`](crate::SingletonError::UseAfterDestroy)
    ///   after the singleton was reset or its vault torn down
    /// - [`SingletonError::DuplicatedSingleton`](crate::SingletonError::DuplicatedSingleton)
    ///   when this handle lost a duplicate declaration and the vault rejects duplicates
    pub fn acquire(&self) -> Result<AccessGuard<T>> {
        self.acquire_in(self.vault())
    }

    /// Same as [`acquire`](Singleton::acquire).
    pub fn get_guard(&self) -> Result<AccessGuard<T>> {
        self.acquire()
    }

    /// Get a guard from an explicit vault instead of the bound one.
    pub fn acquire_in(&self, vault: &Vault) -> Result<AccessGuard<T>> {
        vault
            .locate::<T, Tag>(self.identity(), self.factory)?
            .acquire(vault)
    }

    /// Destroy the instance once its guards are released.
    ///
    /// Blocks until then. Returns `true` if an instance was dropped. Destruction is
    /// terminal: later acquires fail with `UseAfterDestroy`.
    pub fn reset(&self) -> bool {
        self.reset_in(self.vault())
    }

    pub fn reset_in(&self, vault: &Vault) -> bool {
        vault
            .find::<T, Tag>()
            .is_some_and(|slot| slot.request_destroy(vault))
    }

    /// Current lifecycle state; `Empty` if the slot was never located.
    pub fn state(&self) -> SlotState {
        self.state_in(self.vault())
    }

    pub fn state_in(&self, vault: &Vault) -> SlotState {
        vault
            .find::<T, Tag>()
            .map_or(SlotState::Empty, |slot| slot.state())
    }

    /// Number of guards currently outstanding.
    pub fn guard_count(&self) -> usize {
        self.guard_count_in(self.vault())
    }

    pub fn guard_count_in(&self, vault: &Vault) -> usize {
        vault.find::<T, Tag>().map_or(0, |slot| slot.guard_count())
    }

    fn identity(&self) -> usize {
        self as *const Self as usize
    }
}

impl<T, Tag> fmt::Debug for Singleton<T, Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("type", &std::any::type_name::<T>())
            .field("tag", &std::any::type_name::<Tag>())
            .finish()
    }
}
