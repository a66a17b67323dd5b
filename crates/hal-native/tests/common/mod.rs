//! Shared helpers for the hal-native integration tests.

#![allow(dead_code)]

use hal::Lifecycle;
use hal_native::{BoardTable, Device, Registry};

/// Route `tracing` output to the test harness. `RUST_LOG` filters it; safe to
/// call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry holding the default board.
pub fn default_registry() -> Registry {
    init_tracing();
    Registry::from_board(&BoardTable::default_board()).unwrap()
}

/// Resolve `name` and initialize it.
pub fn running(registry: &mut Registry, name: &str) -> Device {
    let mut device = registry.resolve(name).unwrap();
    device.lifecycle().init().unwrap();
    device
}
