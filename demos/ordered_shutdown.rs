//! Ordered shutdown example for singleton-vault.
//!
//! Demonstrates:
//! - Dependencies acquired inside a factory are constructed (and registered) first
//! - Teardown destroys in reverse construction order
//! - Teardown waits for a guard held by a worker thread
//!
//! Run with: `RUST_LOG=debug cargo run --example ordered_shutdown`

use singleton_vault::{declare_singleton, define_vault};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

define_vault!(services);

struct Database {
    url: String,
}

impl Drop for Database {
    fn drop(&mut self) {
        info!(url = %self.url, "closing database");
    }
}

struct UserRepository {
    table: &'static str,
}

impl Drop for UserRepository {
    fn drop(&mut self) {
        // Still usable: the database is destroyed after the repository.
        let db = DATABASE.acquire();
        info!(table = self.table, database_alive = db.is_ok(), "closing repository");
    }
}

fn connect() -> Database {
    Database {
        url: "postgres://localhost/app".to_string(),
    }
}

fn open_repository() -> UserRepository {
    let db = DATABASE.acquire().expect("database available during startup");
    info!(url = %db.url, "repository attached");
    UserRepository { table: "users" }
}

declare_singleton!(static DATABASE: Database = connect, in services::vault);
declare_singleton!(static USERS: UserRepository = open_repository, in services::vault);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== singleton-vault: Ordered Shutdown ===\n");

    println!("1. Acquiring the repository first...");
    println!("   table: {}", USERS.acquire().unwrap().table);
    println!(
        "   construction order: {:?}",
        services::vault().construction_order()
    );

    println!("\n2. A worker holds a guard for a while...");
    let worker = thread::spawn(|| {
        let users = USERS.acquire().unwrap();
        thread::sleep(Duration::from_millis(200));
        println!("   worker done with {}", users.table);
    });
    thread::sleep(Duration::from_millis(50));

    println!("\n3. Teardown waits for the worker, then destroys in reverse order...");
    let destroyed = services::teardown_all();
    println!("   destroyed {destroyed} singletons");

    worker.join().unwrap();
    println!("\n=== Example Complete ===");
}
