//! Integration tests for teardown sequencing.
//!
//! Singletons are destroyed in reverse construction order. A singleton whose factory
//! acquires another one is constructed after it and therefore destroyed before it.

use singleton_vault::{declare_singleton, define_vault, SingletonError, SlotState};
use std::sync::Mutex;

#[test]
fn test_teardown_is_lifo() {
    define_vault!(lifo);

    static LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    struct Logger;
    struct Metrics;

    impl Drop for Logger {
        fn drop(&mut self) {
            LOG.lock().unwrap().push("logger");
        }
    }

    impl Drop for Metrics {
        fn drop(&mut self) {
            LOG.lock().unwrap().push("metrics");
        }
    }

    declare_singleton!(static LOGGER: Logger = || Logger, in lifo::vault);
    declare_singleton!(static METRICS: Metrics = || Metrics, in lifo::vault);

    drop(LOGGER.acquire().unwrap());
    drop(METRICS.acquire().unwrap());

    assert_eq!(lifo::teardown_all(), 2);
    assert_eq!(*LOG.lock().unwrap(), vec!["metrics", "logger"]);
}

#[test]
fn test_dependency_built_inside_factory_outlives_dependent() {
    define_vault!(deps);

    static LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    struct Database;
    struct Repository {
        tables: usize,
    }

    impl Drop for Database {
        fn drop(&mut self) {
            LOG.lock().unwrap().push("database");
        }
    }

    impl Drop for Repository {
        fn drop(&mut self) {
            // The database is still alive while the repository shuts down.
            assert!(DATABASE.acquire().is_ok());
            LOG.lock().unwrap().push("repository");
        }
    }

    fn open_repository() -> Repository {
        let _db = DATABASE.acquire().unwrap();
        Repository { tables: 4 }
    }

    declare_singleton!(static DATABASE: Database = || Database, in deps::vault);
    declare_singleton!(static REPOSITORY: Repository = open_repository, in deps::vault);

    // The repository is requested first, but the database finishes construction first.
    assert_eq!(REPOSITORY.acquire().unwrap().tables, 4);
    assert_eq!(
        deps::vault().construction_order(),
        vec![
            std::any::type_name::<Database>(),
            std::any::type_name::<Repository>()
        ]
    );

    deps::teardown_all();
    assert_eq!(*LOG.lock().unwrap(), vec!["repository", "database"]);
}

#[test]
fn test_acquire_after_teardown_fails() {
    define_vault!(closed);

    declare_singleton!(static USED: String = || "used".to_string(), in closed::vault);
    declare_singleton!(static UNUSED: u32 = || 0, in closed::vault);

    drop(USED.acquire().unwrap());
    closed::teardown_all();

    assert_eq!(
        USED.acquire().unwrap_err(),
        SingletonError::UseAfterDestroy {
            type_name: "alloc::string::String"
        }
    );
    // Never-located singletons cannot be created in a closed vault either.
    assert_eq!(
        UNUSED.acquire().unwrap_err(),
        SingletonError::UseAfterDestroy { type_name: "u32" }
    );
    assert_eq!(USED.state(), SlotState::Destroying);
    assert!(closed::vault().is_closed());
}

#[test]
fn test_repeated_teardown_is_noop() {
    define_vault!(twice);

    declare_singleton!(static VALUE: Vec<u8> = || vec![1, 2], in twice::vault);
    drop(VALUE.acquire().unwrap());

    assert_eq!(twice::teardown_all(), 1);
    assert_eq!(twice::teardown_all(), 0);
}

#[test]
fn test_reset_single_singleton_keeps_others() {
    define_vault!(partial);

    declare_singleton!(static KEEP: u8 = || 1, in partial::vault);
    declare_singleton!(static DROP_ME: u16 = || 2, in partial::vault);

    drop(KEEP.acquire().unwrap());
    drop(DROP_ME.acquire().unwrap());

    assert!(DROP_ME.reset());
    assert!(DROP_ME.acquire().is_err());
    assert_eq!(*KEEP.acquire().unwrap(), 1);

    // Teardown skips the already destroyed slot.
    assert_eq!(partial::teardown_all(), 1);
}
