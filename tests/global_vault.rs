//! Integration tests for the process-wide vault and the crate-level free functions.
//!
//! NOTE: Teardown closes the global vault for the rest of the process, so the whole
//! lifecycle runs as one #[serial] test in its own binary.

use serial_test::serial;
use singleton_vault::{
    clear_duplicated_singleton_handler, clear_recursive_initialization_handler,
    clear_trace_callback, declare_singleton, set_duplicated_singleton_handler,
    set_recursive_initialization_handler, set_trace_callback, teardown_all, DefaultTag,
    Singleton, SingletonError, SlotState, Vault,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, PartialEq)]
struct AppConfig {
    database_url: String,
    max_connections: u32,
}

fn load_config() -> AppConfig {
    AppConfig {
        database_url: "postgresql://localhost/mydb".to_string(),
        max_connections: 100,
    }
}

struct Audit;

declare_singleton!(static CONFIG: AppConfig = load_config);
declare_singleton!(static AUDIT_CONFIG: AppConfig, Audit = load_config);

fn other_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
    }
}

static SHADOW_CONFIG: Singleton<AppConfig, DefaultTag> = Singleton::new(other_config);

#[test]
#[serial]
fn test_global_vault_lifecycle() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    set_trace_callback(move |event| {
        events_clone.lock().unwrap().push(event.to_string());
    });

    static DUPLICATES: AtomicUsize = AtomicUsize::new(0);
    set_duplicated_singleton_handler(|| {
        DUPLICATES.fetch_add(1, Ordering::SeqCst);
    });
    set_recursive_initialization_handler(|| panic!("no recursion expected"));

    // Lazily constructed in the global vault.
    assert!(std::ptr::eq(CONFIG.vault(), Vault::global()));
    assert_eq!(CONFIG.state(), SlotState::Empty);
    {
        let config = CONFIG.get_guard().unwrap();
        assert_eq!(config.max_connections, 100);
        assert_eq!(CONFIG.guard_count(), 1);
    }
    assert_eq!(CONFIG.guard_count(), 0);

    // A tag makes an independent instance of the same type.
    let audit = AUDIT_CONFIG.acquire().unwrap();
    let main = CONFIG.acquire().unwrap();
    assert!(!std::ptr::eq(&*audit, &*main));
    drop((audit, main));

    // A second declaration with a different factory resolves to the first instance.
    let shadow = SHADOW_CONFIG.acquire().unwrap();
    assert_eq!(*shadow, load_config());
    assert_eq!(DUPLICATES.load(Ordering::SeqCst), 1);
    drop(shadow);

    clear_duplicated_singleton_handler();
    clear_recursive_initialization_handler();

    assert_eq!(teardown_all(), 2);
    assert!(Vault::global().is_closed());
    assert_eq!(
        CONFIG.acquire().unwrap_err(),
        SingletonError::UseAfterDestroy {
            type_name: std::any::type_name::<AppConfig>()
        }
    );

    clear_trace_callback();
    let captured = events.lock().unwrap();
    assert!(captured.iter().any(|e| e.starts_with("duplicated_singleton")));
    assert!(captured.iter().any(|e| e == "Tearing down the Vault (2 slots)"));
}
