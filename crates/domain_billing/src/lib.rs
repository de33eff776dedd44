//! Billing Domain - Patient Invoicing and Settlement
//!
//! This crate implements the billing and settlement engine for the clinic
//! platform: invoices raised against rendered services, payments applied
//! through cash, card, bank transfer, insurance, or the patient's internal
//! wallet, and the coupling that keeps an appointment's clinical workflow
//! in step with its financial state.
//!
//! # Money safety
//!
//! The engine upholds three invariants at all times:
//! - an invoice is never over-paid (`0 <= paid_amount <= total_amount`)
//! - a wallet balance is never negative
//! - wallet ledger entries are append-only and snapshot the balance they
//!   moved (`balance_after == balance_before + amount`)
//!
//! # Settlement
//!
//! Applying a payment touches up to four entities (invoice, payment,
//! wallet + ledger entry, appointment). [`settlement::SettlementEngine`]
//! runs the whole mutation inside a single unit of work obtained from the
//! [`ports::BillingStore`]; any failure rolls the entire operation back.
//!
//! ```text
//! request -> load (invoice + wallet + appointment, locked)
//!         -> validate state and amount
//!         -> wallet debit (wallet-funded only)
//!         -> payment record
//!         -> invoice status recompute
//!         -> appointment coupling (on full settlement)
//!         -> commit | rollback
//! ```

pub mod adapters;
pub mod appointment;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod payment;
pub mod ports;
pub mod requests;
pub mod settlement;
pub mod wallet;

pub use appointment::{Appointment, AppointmentStatus};
pub use error::BillingError;
pub use invoice::{Invoice, InvoiceBuilder, InvoiceItem, InvoiceStatus, LineItem};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use ports::{BillingStore, BillingUnitOfWork, PatientRef, ServiceRef, SettlementView};
pub use requests::{
    ApplyPaymentRequest, CreateInvoiceItemRequest, CreateInvoiceRequest, InvoiceFilter, Page,
    PageRequest,
};
pub use settlement::{BillingConfig, SettlementEngine};
pub use wallet::{Wallet, WalletTransaction, WalletTransactionType};
