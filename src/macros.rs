//! Macros for declaring vaults and singleton handles.

/// Creates an isolated vault with a single macro invocation.
///
/// The macro generates a module containing:
/// - The vault static (hidden)
/// - A `vault()` accessor usable with [`Singleton::with_vault`](crate::Singleton::with_vault)
/// - Free functions for teardown, policy hooks and tracing
///
/// An optional second argument is a [`VaultConfig`](crate::VaultConfig) expression. It is
/// evaluated inside the generated module, so spell its paths out in full.
///
/// # Examples
///
/// ```rust
/// use singleton_vault::{define_vault, Singleton};
///
/// define_vault!(services);
///
/// static GREETING: Singleton<String> =
///     Singleton::with_vault(|| "hello".to_string(), services::vault);
///
/// assert_eq!(GREETING.acquire().unwrap().as_str(), "hello");
/// assert_eq!(services::teardown_all(), 1);
/// assert!(GREETING.acquire().is_err());
/// ```
///
/// # Custom Configuration
///
/// ```rust
/// use singleton_vault::define_vault;
///
/// define_vault!(
///     strict,
///     singleton_vault::VaultConfig::new()
///         .duplicate_policy(singleton_vault::DuplicatePolicy::Reject)
/// );
///
/// assert_eq!(
///     strict::vault().config().duplicate_policy,
///     singleton_vault::DuplicatePolicy::Reject
/// );
/// ```
#[macro_export]
macro_rules! define_vault {
    ($name:ident) => {
        $crate::define_vault!($name, $crate::VaultConfig::new());
    };
    ($name:ident, $config:expr) => {
        pub mod $name {
            use std::sync::LazyLock;

            // Vault storage (module-private)
            static VAULT: LazyLock<$crate::Vault> =
                LazyLock::new(|| $crate::Vault::with_config($config));

            /// Accessor for the vault of this module.
            pub fn vault() -> &'static $crate::Vault {
                &VAULT
            }

            /// Destroy every singleton of this vault, last constructed first.
            pub fn teardown_all() -> usize {
                VAULT.teardown_all()
            }

            /// Install the recursive-initialization hook.
            pub fn set_recursive_initialization_handler(handler: impl Fn() + Send + Sync + 'static) {
                VAULT.set_recursive_initialization_handler(handler)
            }

            /// Remove the recursive-initialization hook.
            pub fn clear_recursive_initialization_handler() {
                VAULT.clear_recursive_initialization_handler()
            }

            /// Install the duplicated-singleton hook.
            pub fn set_duplicated_singleton_handler(handler: impl Fn() + Send + Sync + 'static) {
                VAULT.set_duplicated_singleton_handler(handler)
            }

            /// Remove the duplicated-singleton hook.
            pub fn clear_duplicated_singleton_handler() {
                VAULT.clear_duplicated_singleton_handler()
            }

            /// Set a tracing callback for vault operations.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::VaultEvent) + Send + Sync + 'static,
            ) {
                VAULT.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                VAULT.clear_trace_callback()
            }
        }
    };
}

/// Declares a `static` [`Singleton`](crate::Singleton) handle.
///
/// Forms:
/// - `declare_singleton!(static NAME: Type = factory);`
/// - `declare_singleton!(static NAME: Type, Tag = factory);`
/// - either of the above followed by `, in vault_fn` to bind a vault other than the global one.
///
/// # Examples
///
/// ```rust
/// use singleton_vault::{declare_singleton, define_vault};
///
/// struct Backup;
/// define_vault!(storage);
///
/// declare_singleton!(pub static PATHS: Vec<String> = Vec::new);
/// declare_singleton!(static BACKUP_PATHS: Vec<String>, Backup = Vec::new, in storage::vault);
///
/// assert!(PATHS.acquire().unwrap().is_empty());
/// assert!(BACKUP_PATHS.acquire().unwrap().is_empty());
/// assert_eq!(storage::vault().len(), 1);
/// ```
#[macro_export]
macro_rules! declare_singleton {
    ($(#[$meta:meta])* $vis:vis static $name:ident : $ty:ty , $tag:ty = $factory:expr , in $vault:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::Singleton<$ty, $tag> = $crate::Singleton::with_vault($factory, $vault);
    };
    ($(#[$meta:meta])* $vis:vis static $name:ident : $ty:ty , $tag:ty = $factory:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::Singleton<$ty, $tag> = $crate::Singleton::new($factory);
    };
    ($(#[$meta:meta])* $vis:vis static $name:ident : $ty:ty = $factory:expr , in $vault:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::Singleton<$ty> = $crate::Singleton::with_vault($factory, $vault);
    };
    ($(#[$meta:meta])* $vis:vis static $name:ident : $ty:ty = $factory:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::Singleton<$ty> = $crate::Singleton::new($factory);
    };
}
