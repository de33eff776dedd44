//! Store adapters
//!
//! Production deployments back the billing ports with a database adapter
//! (see the `infra_db` crate); the in-memory adapter here is the reference
//! implementation of the unit-of-work contract and the store used by the
//! test suites.

pub mod memory;

pub use memory::{MemoryStore, PatientRecord};
