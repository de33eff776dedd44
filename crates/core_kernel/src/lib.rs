//! Core Kernel - Foundational types for the clinic billing platform
//!
//! This crate provides the building blocks shared by all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed entity identifiers
//! - The actor context carried through every operation

pub mod actor;
pub mod identifiers;
pub mod money;

pub use actor::ActorContext;
pub use identifiers::{
    ActorId, AppointmentId, FacilityId, InvoiceId, PatientId, PaymentId, ServiceId, WalletId,
    WalletTransactionId,
};
pub use money::{Currency, Money, MoneyError, Rate};
