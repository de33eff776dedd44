//! Shared test utilities for the billing workspace
//!
//! Provides fixtures, scenario builders over the in-memory store, and
//! domain-aware assertion helpers, so tests state only what they care
//! about.

pub mod assertions;
pub mod builders;
pub mod fixtures;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes test logging once per process
///
/// Honors `RUST_LOG`; quiet by default.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
