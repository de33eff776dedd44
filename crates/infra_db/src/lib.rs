//! Infrastructure Database Layer
//!
//! PostgreSQL backing for the billing store ports. The repository keeps the
//! unit-of-work contract honest with real database transactions:
//! `SELECT ... FOR UPDATE` row locks on the invoice and wallet, a bounded
//! `lock_timeout` so contention surfaces as an error instead of a hang, and
//! rollback-on-drop for cancelled operations.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PgBillingStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/clinic")).await?;
//! let store = PgBillingStore::new(pool);
//! let engine = SettlementEngine::new(Arc::new(store));
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::billing::PgBillingStore;
