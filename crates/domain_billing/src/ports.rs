//! Billing store ports
//!
//! The engine talks to persistence through these traits. An adapter backs
//! them with a real database ([`infra_db`]-style) or with the in-memory
//! store in [`crate::adapters::memory`] for tests.
//!
//! # Unit of work
//!
//! [`BillingStore::begin`] opens a [`BillingUnitOfWork`]: an explicit value
//! that carries every read and write of one settlement operation. The
//! adapter must guarantee that
//!
//! - `*_for_update` lookups hold an exclusive lock on the returned rows
//!   until the unit of work ends (two settlements against the same invoice
//!   or wallet serialize, they never interleave),
//! - lock waits are bounded and surface as errors rather than hangs,
//! - writes are invisible to other callers until `commit`,
//! - dropping the unit of work without committing discards all writes
//!   (this is what makes mid-operation cancellation safe).
//!
//! Every lookup takes the calling facility and must filter soft-deleted
//! rows; a cross-tenant id behaves exactly like a missing one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{
    AppointmentId, FacilityId, InvoiceId, Money, PatientId, PaymentId, ServiceId,
};

use crate::appointment::Appointment;
use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::requests::{InvoiceFilter, Page, PageRequest};
use crate::wallet::{Wallet, WalletTransaction};

/// Read-only view of a patient, with the wallet eagerly attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRef {
    pub id: PatientId,
    pub facility_id: FacilityId,
    pub full_name: String,
    pub wallet: Option<Wallet>,
}

/// Read-only view of a catalog service (name and price only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRef {
    pub id: ServiceId,
    pub name: String,
    pub price: Money,
}

/// An invoice loaded for settlement with its related rows eagerly attached
/// and locked for the duration of the unit of work
#[derive(Debug, Clone)]
pub struct SettlementView {
    pub invoice: Invoice,
    /// The billed patient's wallet, if one exists
    pub wallet: Option<Wallet>,
    /// The linked appointment, if the invoice has one
    pub appointment: Option<Appointment>,
}

/// Entry point to the billing store
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Opens a unit of work spanning one atomic operation
    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, BillingError>;

    /// Loads an invoice with its items
    async fn get_invoice(
        &self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<Invoice>, BillingError>;

    /// Lists invoices for a facility, newest first
    async fn list_invoices(
        &self,
        facility_id: FacilityId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> Result<Page<Invoice>, BillingError>;

    /// Loads a payment, tenant-checked through its invoice
    async fn get_payment(
        &self,
        id: PaymentId,
        facility_id: FacilityId,
    ) -> Result<Option<Payment>, BillingError>;

    /// Lists payments applied to an invoice, newest first
    async fn list_payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, BillingError>;
}

/// One atomic unit of work over the billing entities
#[async_trait]
pub trait BillingUnitOfWork: Send {
    /// Loads and locks an invoice together with the patient's wallet and
    /// the linked appointment
    async fn invoice_for_update(
        &mut self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<SettlementView>, BillingError>;

    /// Loads a patient with the wallet locked for update
    async fn patient_with_wallet(
        &mut self,
        id: PatientId,
        facility_id: FacilityId,
    ) -> Result<Option<PatientRef>, BillingError>;

    /// Loads and locks an appointment
    async fn appointment(
        &mut self,
        id: AppointmentId,
        facility_id: FacilityId,
    ) -> Result<Option<Appointment>, BillingError>;

    /// Looks up a catalog service
    async fn service(&mut self, id: ServiceId) -> Result<Option<ServiceRef>, BillingError>;

    /// Inserts a new invoice with its items; fails with
    /// [`BillingError::DuplicateReference`] on an invoice-number collision
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError>;

    /// Persists the mutable invoice fields (paid amount, status, audit)
    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError>;

    /// Inserts a payment record; fails with
    /// [`BillingError::DuplicateReference`] on a reference collision
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), BillingError>;

    /// Persists a wallet's balance
    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<(), BillingError>;

    /// Appends a wallet ledger entry
    async fn insert_wallet_transaction(
        &mut self,
        transaction: &WalletTransaction,
    ) -> Result<(), BillingError>;

    /// Persists an appointment's workflow status
    async fn update_appointment(&mut self, appointment: &Appointment)
        -> Result<(), BillingError>;

    /// Publishes every write atomically
    async fn commit(self: Box<Self>) -> Result<(), BillingError>;

    /// Discards every write
    async fn rollback(self: Box<Self>) -> Result<(), BillingError>;
}
