//! In-memory billing store
//!
//! Implements the unit-of-work contract with a store-wide async mutex and
//! staged-copy writes: `begin` takes the lock and clones the state, every
//! write lands on the clone, and `commit` publishes the clone back. A unit
//! of work that is dropped (rollback, failure, cancellation) discards the
//! clone, so partial writes are never observable.
//!
//! Holding the lock for the lifetime of the unit of work serializes
//! conflicting settlements the same way the database adapter's row locks
//! do, at store rather than row granularity.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;

use core_kernel::{
    AppointmentId, FacilityId, InvoiceId, Money, PatientId, PaymentId, ServiceId, WalletId,
};

use crate::appointment::Appointment;
use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::ports::{
    BillingStore, BillingUnitOfWork, PatientRef, ServiceRef, SettlementView,
};
use crate::requests::{InvoiceFilter, Page, PageRequest};
use crate::wallet::{Wallet, WalletTransaction};

/// A patient row as billing sees it
#[derive(Debug, Clone)]
pub struct PatientRecord {
    pub id: PatientId,
    pub facility_id: FacilityId,
    pub full_name: String,
    pub is_deleted: bool,
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
    patients: HashMap<PatientId, PatientRecord>,
    services: HashMap<ServiceId, ServiceRef>,
    appointments: HashMap<AppointmentId, Appointment>,
    wallets: HashMap<WalletId, Wallet>,
    wallet_transactions: Vec<WalletTransaction>,
    invoices: HashMap<InvoiceId, Invoice>,
    payments: HashMap<PaymentId, Payment>,
}

impl MemoryState {
    fn visible_invoice(&self, id: InvoiceId, facility_id: FacilityId) -> Option<&Invoice> {
        self.invoices
            .get(&id)
            .filter(|invoice| invoice.facility_id == facility_id && !invoice.is_deleted)
    }

    fn wallet_of(&self, patient_id: PatientId) -> Option<&Wallet> {
        self.wallets
            .values()
            .find(|wallet| wallet.patient_id == patient_id)
    }
}

/// In-memory implementation of [`BillingStore`]
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    lock_timeout: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            lock_timeout: Duration::from_secs(5),
        }
    }

    /// Overrides how long `begin` waits for the store lock
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    // Seeding helpers for collaborator-owned rows (master data lives
    // outside this engine in production).

    pub async fn seed_patient(&self, patient: PatientRecord) {
        self.state.lock().await.patients.insert(patient.id, patient);
    }

    pub async fn seed_wallet(&self, wallet: Wallet) {
        self.state.lock().await.wallets.insert(wallet.id, wallet);
    }

    pub async fn seed_service(&self, service: ServiceRef) {
        self.state.lock().await.services.insert(service.id, service);
    }

    pub async fn seed_appointment(&self, appointment: Appointment) {
        self.state
            .lock()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    // Inspection helpers for asserting on committed state.

    pub async fn invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.state.lock().await.invoices.get(&id).cloned()
    }

    pub async fn appointment(&self, id: AppointmentId) -> Option<Appointment> {
        self.state.lock().await.appointments.get(&id).cloned()
    }

    pub async fn wallet_balance(&self, id: WalletId) -> Option<Money> {
        self.state
            .lock()
            .await
            .wallets
            .get(&id)
            .map(|wallet| wallet.balance)
    }

    pub async fn wallet_transactions(&self, wallet_id: WalletId) -> Vec<WalletTransaction> {
        self.state
            .lock()
            .await
            .wallet_transactions
            .iter()
            .filter(|transaction| transaction.wallet_id == wallet_id)
            .cloned()
            .collect()
    }

    pub async fn payment_count(&self) -> usize {
        self.state.lock().await.payments.len()
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, BillingError> {
        let guard = timeout(self.lock_timeout, self.state.clone().lock_owned())
            .await
            .map_err(|_| {
                BillingError::operation_failed("Timed out waiting for the billing store lock")
            })?;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, work }))
    }

    async fn get_invoice(
        &self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<Invoice>, BillingError> {
        let state = self.state.lock().await;
        Ok(state.visible_invoice(id, facility_id).cloned())
    }

    async fn list_invoices(
        &self,
        facility_id: FacilityId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> Result<Page<Invoice>, BillingError> {
        let state = self.state.lock().await;

        let mut matches: Vec<&Invoice> = state
            .invoices
            .values()
            .filter(|invoice| invoice.facility_id == facility_id && !invoice.is_deleted)
            .filter(|invoice| matches_filter(invoice, filter))
            .collect();
        matches.sort_by(|a, b| b.invoice_date.cmp(&a.invoice_date));

        let total_count = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, page, total_count))
    }

    async fn get_payment(
        &self,
        id: PaymentId,
        facility_id: FacilityId,
    ) -> Result<Option<Payment>, BillingError> {
        let state = self.state.lock().await;
        let payment = state.payments.get(&id).filter(|payment| !payment.is_deleted);
        // Tenant check goes through the owning invoice
        Ok(payment
            .filter(|payment| {
                state
                    .visible_invoice(payment.invoice_id, facility_id)
                    .is_some()
            })
            .cloned())
    }

    async fn list_payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, BillingError> {
        let state = self.state.lock().await;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|payment| payment.invoice_id == invoice_id && !payment.is_deleted)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(payments)
    }
}

fn matches_filter(invoice: &Invoice, filter: &InvoiceFilter) -> bool {
    if let Some(patient_id) = filter.patient_id {
        if invoice.patient_id != patient_id {
            return false;
        }
    }
    let date = invoice.invoice_date.date_naive();
    if let Some(start) = filter.start_date {
        if date < start {
            return false;
        }
    }
    if let Some(end) = filter.end_date {
        if date > end {
            return false;
        }
    }
    true
}

struct MemoryUnitOfWork {
    /// Keeps the store locked until this unit of work ends
    guard: OwnedMutexGuard<MemoryState>,
    /// Staged copy all writes land on
    work: MemoryState,
}

#[async_trait]
impl BillingUnitOfWork for MemoryUnitOfWork {
    async fn invoice_for_update(
        &mut self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<SettlementView>, BillingError> {
        let invoice = match self.work.visible_invoice(id, facility_id) {
            Some(invoice) => invoice.clone(),
            None => return Ok(None),
        };

        let patient_visible = self
            .work
            .patients
            .get(&invoice.patient_id)
            .is_some_and(|patient| !patient.is_deleted);
        let wallet = if patient_visible {
            self.work.wallet_of(invoice.patient_id).cloned()
        } else {
            None
        };

        let appointment = invoice
            .appointment_id
            .and_then(|appointment_id| self.work.appointments.get(&appointment_id))
            .filter(|appointment| !appointment.is_deleted)
            .cloned();

        Ok(Some(SettlementView {
            invoice,
            wallet,
            appointment,
        }))
    }

    async fn patient_with_wallet(
        &mut self,
        id: PatientId,
        facility_id: FacilityId,
    ) -> Result<Option<PatientRef>, BillingError> {
        let patient = self
            .work
            .patients
            .get(&id)
            .filter(|patient| patient.facility_id == facility_id && !patient.is_deleted)
            .cloned();

        Ok(patient.map(|patient| PatientRef {
            wallet: self.work.wallet_of(patient.id).cloned(),
            id: patient.id,
            facility_id: patient.facility_id,
            full_name: patient.full_name,
        }))
    }

    async fn appointment(
        &mut self,
        id: AppointmentId,
        facility_id: FacilityId,
    ) -> Result<Option<Appointment>, BillingError> {
        Ok(self
            .work
            .appointments
            .get(&id)
            .filter(|appointment| {
                appointment.facility_id == facility_id && !appointment.is_deleted
            })
            .cloned())
    }

    async fn service(&mut self, id: ServiceId) -> Result<Option<ServiceRef>, BillingError> {
        Ok(self.work.services.get(&id).cloned())
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError> {
        if self
            .work
            .invoices
            .values()
            .any(|existing| existing.invoice_number == invoice.invoice_number)
        {
            return Err(BillingError::DuplicateReference(
                invoice.invoice_number.clone(),
            ));
        }
        self.work.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError> {
        self.work.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), BillingError> {
        if self
            .work
            .payments
            .values()
            .any(|existing| existing.payment_reference == payment.payment_reference)
        {
            return Err(BillingError::DuplicateReference(
                payment.payment_reference.clone(),
            ));
        }
        self.work.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<(), BillingError> {
        self.work.wallets.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn insert_wallet_transaction(
        &mut self,
        transaction: &WalletTransaction,
    ) -> Result<(), BillingError> {
        self.work.wallet_transactions.push(transaction.clone());
        Ok(())
    }

    async fn update_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<(), BillingError> {
        self.work
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), BillingError> {
        let MemoryUnitOfWork { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BillingError> {
        // Dropping the staged copy and the guard is the rollback
        Ok(())
    }
}
