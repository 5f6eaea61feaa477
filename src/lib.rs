//! # Singleton Vault
//!
//! Guarded lazy singletons: a global object is constructed on first access, pinned alive by
//! scoped guards, and destroyed only once every guard has been released.
//!
//! Handles are stateless and can be declared as `static` items. The instances themselves live
//! in a [`Vault`], which records construction order so that shutdown can destroy singletons in
//! reverse order (a singleton constructed while building another one outlives it).
//!
//! ## Quick Start
//!
//! ```rust
//! use singleton_vault::{Singleton, SlotState};
//!
//! struct Config {
//!     name: String,
//! }
//!
//! static CONFIG: Singleton<Config> = Singleton::new(|| Config {
//!     name: "demo".to_string(),
//! });
//!
//! // First access runs the factory.
//! let guard = CONFIG.acquire().unwrap();
//! assert_eq!(guard.name, "demo");
//! assert_eq!(CONFIG.guard_count(), 1);
//!
//! // Dropping the guard releases it.
//! drop(guard);
//! assert_eq!(CONFIG.state(), SlotState::Live);
//!
//! // Shutdown destroys everything, last constructed first.
//! singleton_vault::teardown_all();
//! assert!(CONFIG.acquire().is_err());
//! ```
//!
//! ## Features
//!
//! - **Exactly-once construction**: concurrent first accesses run the factory once
//! - **Guarded destruction**: a reset or teardown waits until outstanding guards are dropped
//! - **Violation hooks**: recursive initialization and duplicated declarations are reported
//! - **Tracing support**: `tracing` logs plus an optional event callback per vault
//!
//! ## Main Items
//!
//! - [`Singleton`] - the handle; [`Singleton::acquire`] returns an [`AccessGuard`]
//! - [`Vault`] - slot registry and teardown sequencing
//! - [`define_vault!`] / [`declare_singleton!`] - declaration macros
//! - [`teardown_all`] - destroy every singleton of the global vault
//! - [`set_recursive_initialization_handler`] / [`set_duplicated_singleton_handler`] - policy hooks
//! - [`set_trace_callback`] - event tracing for the global vault
//!
//! ## Deadlocks
//!
//! A guard that is never dropped blocks the destruction of its singleton forever, and
//! so does requesting destruction on a thread that still holds a guard of that singleton.
//! Two factories that need each other while being constructed on different threads
//! deadlock as well.

mod guard;
mod macros;
mod singleton;
mod slot;
mod vault;
mod vault_error;
mod vault_event;

pub use guard::AccessGuard;
pub use singleton::{DefaultTag, Singleton};
pub use slot::SlotState;
pub use vault::{DuplicatePolicy, PolicyHook, TraceCallback, Vault, VaultConfig};
pub use vault_error::{Result, SingletonError};
pub use vault_event::VaultEvent;

/// Destroy every singleton of the global vault, last constructed first.
///
/// See [`Vault::teardown_all`].
pub fn teardown_all() -> usize {
    Vault::global().teardown_all()
}

/// Install the recursive-initialization hook of the global vault.
pub fn set_recursive_initialization_handler(handler: impl Fn() + Send + Sync + 'static) {
    Vault::global().set_recursive_initialization_handler(handler);
}

/// Remove the recursive-initialization hook of the global vault.
pub fn clear_recursive_initialization_handler() {
    Vault::global().clear_recursive_initialization_handler();
}

/// Install the duplicated-singleton hook of the global vault.
pub fn set_duplicated_singleton_handler(handler: impl Fn() + Send + Sync + 'static) {
    Vault::global().set_duplicated_singleton_handler(handler);
}

/// Remove the duplicated-singleton hook of the global vault.
pub fn clear_duplicated_singleton_handler() {
    Vault::global().clear_duplicated_singleton_handler();
}

/// Set a tracing callback for operations on the global vault.
///
/// # Example
/// ```rust
/// use singleton_vault::{set_trace_callback, VaultEvent};
///
/// set_trace_callback(|event: &VaultEvent| println!("[vault-trace] {event}"));
/// ```
pub fn set_trace_callback(callback: impl Fn(&VaultEvent) + Send + Sync + 'static) {
    Vault::global().set_trace_callback(callback);
}

/// Clears the tracing callback of the global vault.
pub fn clear_trace_callback() {
    Vault::global().clear_trace_callback();
}
