//! Policy hook example for singleton-vault.
//!
//! Demonstrates:
//! - A recursive-initialization hook observing a factory that re-enters itself
//! - A duplicated-singleton hook with the default `Share` policy
//! - The `Reject` policy on a separate vault
//!
//! Run with: `cargo run --example policy_hooks`

use singleton_vault::{declare_singleton, define_vault, Singleton};

define_vault!(lenient);
define_vault!(
    strict,
    singleton_vault::VaultConfig::new()
        .duplicate_policy(singleton_vault::DuplicatePolicy::Reject)
);

struct Registry {
    entries: usize,
}

fn build_registry() -> Registry {
    // Re-entering the slot under construction fails instead of deadlocking.
    if let Err(e) = REGISTRY.acquire() {
        println!("   inner acquire failed: {e}");
    }
    Registry { entries: 3 }
}

declare_singleton!(static REGISTRY: Registry = build_registry, in lenient::vault);

declare_singleton!(static LENIENT_OWNER: String = || "owner".to_string(), in lenient::vault);
static LENIENT_COPY: Singleton<String> =
    Singleton::with_vault(|| "copy".to_string(), lenient::vault);

declare_singleton!(static STRICT_OWNER: String = || "owner".to_string(), in strict::vault);
static STRICT_COPY: Singleton<String> = Singleton::with_vault(|| "copy".to_string(), strict::vault);

fn main() {
    println!("=== singleton-vault: Policy Hooks ===\n");

    lenient::set_recursive_initialization_handler(|| {
        println!("   [hook] recursive initialization detected");
    });
    lenient::set_duplicated_singleton_handler(|| {
        println!("   [hook] duplicated singleton declaration");
    });
    strict::set_duplicated_singleton_handler(|| {
        println!("   [hook] duplicated singleton declaration (strict)");
    });

    println!("1. Factory re-entering itself...");
    println!("   entries: {}", REGISTRY.acquire().unwrap().entries);

    println!("\n2. Two declarations, Share policy...");
    println!("   owner sees: {}", *LENIENT_OWNER.acquire().unwrap());
    println!("   copy sees:  {}", *LENIENT_COPY.acquire().unwrap());

    println!("\n3. Two declarations, Reject policy...");
    println!("   owner sees: {}", *STRICT_OWNER.acquire().unwrap());
    match STRICT_COPY.acquire() {
        Ok(value) => println!("   unexpected: copy sees {}", *value),
        Err(e) => println!("   Error (expected): {e}"),
    }

    println!("\n=== Example Complete ===");
}
