//! Basic usage example for singleton-vault.
//!
//! Demonstrates:
//! - Declaring static singleton handles, with and without tags
//! - Lazy construction on first `acquire()`
//! - Guard counting while guards are alive
//! - Terminal teardown of the global vault
//!
//! Run with: `RUST_LOG=debug cargo run --example basic_usage`

use singleton_vault::{declare_singleton, Singleton};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct AppConfig {
    name: String,
    version: u32,
    debug_mode: bool,
}

fn load_config() -> AppConfig {
    println!("   (factory) loading AppConfig");
    AppConfig {
        name: "MyApp".to_string(),
        version: 1,
        debug_mode: true,
    }
}

struct Greeting;
struct Farewell;

declare_singleton!(static CONFIG: AppConfig = load_config);
declare_singleton!(static HELLO: String, Greeting = || "Hello, singleton-vault!".to_string());
static GOODBYE: Singleton<String, Farewell> = Singleton::new(|| "Goodbye!".to_string());

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn main() {
    setup_tracing();
    println!("=== singleton-vault: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Nothing exists before first use
    // -------------------------------------------------------------------------
    println!("1. Before first use...");
    println!("   CONFIG state: {:?}", CONFIG.state());

    // -------------------------------------------------------------------------
    // 2. First acquire runs the factory
    // -------------------------------------------------------------------------
    println!("\n2. Acquiring CONFIG...");
    {
        let config = CONFIG.acquire().unwrap();
        println!("   {} v{} (debug: {})", config.name, config.version, config.debug_mode);
        println!("   guards while in scope: {}", CONFIG.guard_count());
    }
    println!("   guards after scope:    {}", CONFIG.guard_count());

    // -------------------------------------------------------------------------
    // 3. Later acquires reuse the instance
    // -------------------------------------------------------------------------
    println!("\n3. Acquiring CONFIG again (no factory call)...");
    let again = CONFIG.get_guard().unwrap();
    println!("   {:?}", *again);
    drop(again);

    // -------------------------------------------------------------------------
    // 4. Tags keep independent singletons of one type
    // -------------------------------------------------------------------------
    println!("\n4. Tagged singletons of the same type...");
    println!("   Greeting: {}", *HELLO.acquire().unwrap());
    println!("   Farewell: {}", *GOODBYE.acquire().unwrap());

    // -------------------------------------------------------------------------
    // 5. Teardown is terminal
    // -------------------------------------------------------------------------
    println!("\n5. Tearing down the global vault...");
    let destroyed = singleton_vault::teardown_all();
    println!("   destroyed {destroyed} singletons");

    match CONFIG.acquire() {
        Ok(_) => println!("   unexpected: CONFIG still available"),
        Err(e) => println!("   Error (expected): {e}"),
    }

    println!("\n=== Example Complete ===");
}
