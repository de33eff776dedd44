//! Settlement engine tests
//!
//! These drive the coordinator against the in-memory store, covering the
//! money-safety scenarios: full and partial settlement, wallet funding,
//! rejection paths, tenant isolation, and the atomicity guarantee under
//! injected failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{
    ActorContext, ActorId, AppointmentId, Currency, FacilityId, InvoiceId, Money, PatientId,
    PaymentId, ServiceId,
};
use domain_billing::adapters::{MemoryStore, PatientRecord};
use domain_billing::{
    Appointment, AppointmentStatus, ApplyPaymentRequest, BillingError, BillingStore,
    BillingUnitOfWork, CreateInvoiceItemRequest, CreateInvoiceRequest, Invoice, InvoiceFilter,
    InvoiceStatus, Page, PageRequest, Payment, PaymentMethod, PaymentStatus, SettlementEngine,
    ServiceRef, Wallet, WalletTransaction,
};

struct Clinic {
    store: MemoryStore,
    engine: SettlementEngine,
    actor: ActorContext,
    patient_id: PatientId,
}

async fn clinic() -> Clinic {
    let store = MemoryStore::new();
    let actor = ActorContext::new(FacilityId::new(), ActorId::new(), "cashier");
    let patient_id = PatientId::new();

    store
        .seed_patient(PatientRecord {
            id: patient_id,
            facility_id: actor.facility_id,
            full_name: "Ada Obi".to_string(),
            is_deleted: false,
        })
        .await;

    let engine = SettlementEngine::new(Arc::new(store.clone()));
    Clinic {
        store,
        engine,
        actor,
        patient_id,
    }
}

impl Clinic {
    async fn seed_wallet(&self, balance: Decimal) -> Wallet {
        let wallet = Wallet::with_balance(self.patient_id, Money::new(balance, Currency::NGN));
        self.store.seed_wallet(wallet.clone()).await;
        wallet
    }

    async fn seed_appointment(&self, status: AppointmentStatus) -> AppointmentId {
        let appointment =
            Appointment::new(self.actor.facility_id, self.patient_id, status, Utc::now());
        let id = appointment.id;
        self.store.seed_appointment(appointment).await;
        id
    }

    async fn invoice_for(
        &self,
        total: Decimal,
        appointment_id: Option<AppointmentId>,
    ) -> Invoice {
        self.engine
            .create_invoice(
                CreateInvoiceRequest {
                    patient_id: self.patient_id,
                    appointment_id,
                    discount_percentage: Decimal::ZERO,
                    notes: None,
                    items: vec![CreateInvoiceItemRequest {
                        service_id: None,
                        description: "Consultation".to_string(),
                        quantity: 1,
                        unit_price: total,
                        discount_amount: Decimal::ZERO,
                    }],
                },
                &self.actor,
            )
            .await
            .unwrap()
    }

    fn pay(&self, invoice_id: InvoiceId, amount: Decimal, method: PaymentMethod) -> ApplyPaymentRequest {
        ApplyPaymentRequest {
            invoice_id,
            amount,
            method,
            transaction_id: None,
            notes: None,
        }
    }
}

// ============================================================================
// Settlement scenarios
// ============================================================================

#[tokio::test]
async fn test_cash_full_settlement_advances_appointment() {
    let clinic = clinic().await;
    let appointment_id = clinic.seed_appointment(AppointmentStatus::AwaitingPayment).await;
    let invoice = clinic.invoice_for(dec!(5000), Some(appointment_id)).await;

    let payment = clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(5000), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount.amount(), dec!(5000));

    let settled = clinic.store.invoice(invoice.id).await.unwrap();
    assert_eq!(settled.status, InvoiceStatus::Paid);
    assert_eq!(settled.paid_amount.amount(), dec!(5000));

    let appointment = clinic.store.appointment(appointment_id).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::AwaitingVitals);
}

#[tokio::test]
async fn test_partial_payment_leaves_outstanding() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(5000), None).await;

    clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(2000), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    let after = clinic.store.invoice(invoice.id).await.unwrap();
    assert_eq!(after.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(after.paid_amount.amount(), dec!(2000));
    assert_eq!(after.outstanding_amount().amount(), dec!(3000));
}

#[tokio::test]
async fn test_partial_settlement_does_not_touch_appointment() {
    let clinic = clinic().await;
    let appointment_id = clinic.seed_appointment(AppointmentStatus::AwaitingPayment).await;
    let invoice = clinic.invoice_for(dec!(5000), Some(appointment_id)).await;

    clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(2000), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    let appointment = clinic.store.appointment(appointment_id).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::AwaitingPayment);
}

#[tokio::test]
async fn test_settlement_leaves_manually_progressed_appointment_alone() {
    let clinic = clinic().await;
    let appointment_id = clinic.seed_appointment(AppointmentStatus::InProgress).await;
    let invoice = clinic.invoice_for(dec!(1000), Some(appointment_id)).await;

    clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(1000), PaymentMethod::Card), &clinic.actor)
        .await
        .unwrap();

    let appointment = clinic.store.appointment(appointment_id).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::InProgress);
}

#[tokio::test]
async fn test_wallet_payment_debits_and_logs() {
    let clinic = clinic().await;
    let wallet = clinic.seed_wallet(dec!(8000)).await;
    let invoice = clinic.invoice_for(dec!(5000), None).await;

    let payment = clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(5000), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap();

    assert_eq!(payment.method, PaymentMethod::Wallet);
    assert_eq!(
        clinic.store.wallet_balance(wallet.id).await.unwrap().amount(),
        dec!(3000)
    );

    let transactions = clinic.store.wallet_transactions(wallet.id).await;
    assert_eq!(transactions.len(), 1);
    let transaction = &transactions[0];
    assert_eq!(transaction.amount.amount(), dec!(-5000));
    assert_eq!(transaction.balance_before.amount(), dec!(8000));
    assert_eq!(transaction.balance_after.amount(), dec!(3000));
    assert!(transaction
        .description
        .as_deref()
        .unwrap()
        .contains(&invoice.invoice_number));
}

#[tokio::test]
async fn test_wallet_payment_insufficient_funds_changes_nothing() {
    let clinic = clinic().await;
    let wallet = clinic.seed_wallet(dec!(1000)).await;
    let invoice = clinic.invoice_for(dec!(5000), None).await;

    let err = clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(5000), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::InsufficientFunds));
    assert_eq!(err.to_string(), "Insufficient wallet balance");
    assert_eq!(
        clinic.store.wallet_balance(wallet.id).await.unwrap().amount(),
        dec!(1000)
    );
    assert_eq!(clinic.store.payment_count().await, 0);
    assert!(clinic.store.wallet_transactions(wallet.id).await.is_empty());
}

#[tokio::test]
async fn test_wallet_payment_without_wallet_is_insufficient_funds() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(500), None).await;

    let err = clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(500), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap_err();

    // "No wallet" is indistinguishable from "not enough balance"
    assert!(matches!(err, BillingError::InsufficientFunds));
}

#[tokio::test]
async fn test_overpayment_rejected_reporting_both_amounts() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(5000), None).await;

    clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(4000), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    let err = clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(2000), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("(2000.00)"));
    assert!(message.contains("exceeds outstanding amount (1000.00)"));

    let after = clinic.store.invoice(invoice.id).await.unwrap();
    assert_eq!(after.paid_amount.amount(), dec!(4000));
}

#[tokio::test]
async fn test_paying_paid_and_cancelled_invoices_rejected() {
    let clinic = clinic().await;
    let paid = clinic.invoice_for(dec!(100), None).await;
    clinic
        .engine
        .apply_payment(clinic.pay(paid.id, dec!(100), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    let err = clinic
        .engine
        .apply_payment(clinic.pay(paid.id, dec!(1), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invoice is already paid");

    let cancelled = clinic.invoice_for(dec!(100), None).await;
    clinic
        .engine
        .cancel_invoice(cancelled.id, clinic.actor.facility_id, &clinic.actor)
        .await
        .unwrap();

    let err = clinic
        .engine
        .apply_payment(clinic.pay(cancelled.id, dec!(50), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot process payment for a cancelled invoice");
}

#[tokio::test]
async fn test_cancel_rules() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(100), None).await;
    clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(100), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    let err = clinic
        .engine
        .cancel_invoice(invoice.id, clinic.actor.facility_id, &clinic.actor)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot cancel a paid invoice");
    assert_eq!(
        clinic.store.invoice(invoice.id).await.unwrap().status,
        InvoiceStatus::Paid
    );

    let other = clinic.invoice_for(dec!(100), None).await;
    clinic
        .engine
        .cancel_invoice(other.id, clinic.actor.facility_id, &clinic.actor)
        .await
        .unwrap();
    let err = clinic
        .engine
        .cancel_invoice(other.id, clinic.actor.facility_id, &clinic.actor)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invoice is already cancelled");
}

// ============================================================================
// Tenant isolation and reads
// ============================================================================

#[tokio::test]
async fn test_cross_facility_lookups_are_not_found() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(100), None).await;
    let stranger = ActorContext::new(FacilityId::new(), ActorId::new(), "other-desk");

    let err = clinic
        .engine
        .get_invoice(invoice.id, stranger.facility_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(50), PaymentMethod::Cash), &stranger)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = clinic
        .engine
        .cancel_invoice(invoice.id, stranger.facility_id, &stranger)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_invoice_read_is_idempotent() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(750), None).await;

    let first = clinic
        .engine
        .get_invoice(invoice.id, clinic.actor.facility_id)
        .await
        .unwrap();
    let second = clinic
        .engine
        .get_invoice(invoice.id, clinic.actor.facility_id)
        .await
        .unwrap();

    assert_eq!(first.total_amount, second.total_amount);
    assert_eq!(first.status, second.status);
}

#[tokio::test]
async fn test_unknown_payment_is_not_found() {
    let clinic = clinic().await;
    let err = clinic
        .engine
        .get_payment(PaymentId::new(), clinic.actor.facility_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_payments_requires_existing_invoice() {
    let clinic = clinic().await;
    let err = clinic
        .engine
        .list_payments_for_invoice(InvoiceId::new(), clinic.actor.facility_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_payments_newest_first() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(300), None).await;

    for amount in [dec!(100), dec!(150)] {
        clinic
            .engine
            .apply_payment(clinic.pay(invoice.id, amount, PaymentMethod::Cash), &clinic.actor)
            .await
            .unwrap();
    }

    let payments = clinic
        .engine
        .list_payments_for_invoice(invoice.id, clinic.actor.facility_id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 2);
    assert!(payments[0].payment_date >= payments[1].payment_date);
    assert_eq!(payments[0].amount.amount(), dec!(150));
}

#[tokio::test]
async fn test_list_invoices_filters_by_patient() {
    let clinic = clinic().await;
    clinic.invoice_for(dec!(100), None).await;
    clinic.invoice_for(dec!(200), None).await;

    let page = clinic
        .engine
        .list_invoices(
            clinic.actor.facility_id,
            &InvoiceFilter::for_patient(clinic.patient_id),
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);

    let none: Page<Invoice> = clinic
        .engine
        .list_invoices(
            clinic.actor.facility_id,
            &InvoiceFilter::for_patient(PatientId::new()),
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(none.total_count, 0);
}

// ============================================================================
// Invoice creation coupling and catalog resolution
// ============================================================================

#[tokio::test]
async fn test_create_invoice_advances_checked_in_appointment() {
    let clinic = clinic().await;
    let appointment_id = clinic.seed_appointment(AppointmentStatus::CheckedIn).await;

    clinic.invoice_for(dec!(100), Some(appointment_id)).await;

    let appointment = clinic.store.appointment(appointment_id).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::AwaitingPayment);
}

#[tokio::test]
async fn test_create_invoice_for_unknown_patient_fails() {
    let clinic = clinic().await;
    let err = clinic
        .engine
        .create_invoice(
            CreateInvoiceRequest {
                patient_id: PatientId::new(),
                appointment_id: None,
                discount_percentage: Decimal::ZERO,
                notes: None,
                items: vec![CreateInvoiceItemRequest {
                    service_id: None,
                    description: "Consultation".to_string(),
                    quantity: 1,
                    unit_price: dec!(100),
                    discount_amount: Decimal::ZERO,
                }],
            },
            &clinic.actor,
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Patient not found");
}

#[tokio::test]
async fn test_service_name_overrides_item_description() {
    let clinic = clinic().await;
    let service = ServiceRef {
        id: ServiceId::new(),
        name: "Malaria Parasite Test".to_string(),
        price: Money::new(dec!(2500), Currency::NGN),
    };
    clinic.store.seed_service(service.clone()).await;

    let invoice = clinic
        .engine
        .create_invoice(
            CreateInvoiceRequest {
                patient_id: clinic.patient_id,
                appointment_id: None,
                discount_percentage: Decimal::ZERO,
                notes: None,
                items: vec![CreateInvoiceItemRequest {
                    service_id: Some(service.id),
                    description: "lab work".to_string(),
                    quantity: 1,
                    unit_price: dec!(2500),
                    discount_amount: Decimal::ZERO,
                }],
            },
            &clinic.actor,
        )
        .await
        .unwrap();

    assert_eq!(invoice.items[0].description, "Malaria Parasite Test");
    assert_eq!(invoice.items[0].service_id, Some(service.id));
}

// ============================================================================
// Atomicity under injected failures
// ============================================================================

#[derive(Clone, Copy, PartialEq)]
enum FailPoint {
    UpdateInvoice,
    FirstInsertPayment,
}

/// Delegating store that injects a failure at a chosen write
#[derive(Clone)]
struct FaultyStore {
    inner: MemoryStore,
    fail: FailPoint,
    tripped: Arc<AtomicBool>,
}

#[async_trait]
impl BillingStore for FaultyStore {
    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, BillingError> {
        Ok(Box::new(FaultyUnitOfWork {
            inner: self.inner.begin().await?,
            fail: self.fail,
            tripped: self.tripped.clone(),
        }))
    }

    async fn get_invoice(
        &self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<Invoice>, BillingError> {
        self.inner.get_invoice(id, facility_id).await
    }

    async fn list_invoices(
        &self,
        facility_id: FacilityId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> Result<Page<Invoice>, BillingError> {
        self.inner.list_invoices(facility_id, filter, page).await
    }

    async fn get_payment(
        &self,
        id: PaymentId,
        facility_id: FacilityId,
    ) -> Result<Option<Payment>, BillingError> {
        self.inner.get_payment(id, facility_id).await
    }

    async fn list_payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, BillingError> {
        self.inner.list_payments_for_invoice(invoice_id).await
    }
}

struct FaultyUnitOfWork {
    inner: Box<dyn BillingUnitOfWork>,
    fail: FailPoint,
    tripped: Arc<AtomicBool>,
}

#[async_trait]
impl BillingUnitOfWork for FaultyUnitOfWork {
    async fn invoice_for_update(
        &mut self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<domain_billing::SettlementView>, BillingError> {
        self.inner.invoice_for_update(id, facility_id).await
    }

    async fn patient_with_wallet(
        &mut self,
        id: PatientId,
        facility_id: FacilityId,
    ) -> Result<Option<domain_billing::PatientRef>, BillingError> {
        self.inner.patient_with_wallet(id, facility_id).await
    }

    async fn appointment(
        &mut self,
        id: AppointmentId,
        facility_id: FacilityId,
    ) -> Result<Option<Appointment>, BillingError> {
        self.inner.appointment(id, facility_id).await
    }

    async fn service(&mut self, id: ServiceId) -> Result<Option<ServiceRef>, BillingError> {
        self.inner.service(id).await
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError> {
        self.inner.insert_invoice(invoice).await
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError> {
        if self.fail == FailPoint::UpdateInvoice {
            return Err(BillingError::operation_failed("injected failure"));
        }
        self.inner.update_invoice(invoice).await
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), BillingError> {
        if self.fail == FailPoint::FirstInsertPayment && !self.tripped.swap(true, Ordering::SeqCst)
        {
            return Err(BillingError::DuplicateReference(
                payment.payment_reference.clone(),
            ));
        }
        self.inner.insert_payment(payment).await
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<(), BillingError> {
        self.inner.update_wallet(wallet).await
    }

    async fn insert_wallet_transaction(
        &mut self,
        transaction: &WalletTransaction,
    ) -> Result<(), BillingError> {
        self.inner.insert_wallet_transaction(transaction).await
    }

    async fn update_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<(), BillingError> {
        self.inner.update_appointment(appointment).await
    }

    async fn commit(self: Box<Self>) -> Result<(), BillingError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), BillingError> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn test_failure_after_payment_insert_leaves_no_trace() {
    let clinic = clinic().await;
    let wallet = clinic.seed_wallet(dec!(8000)).await;
    let invoice = clinic.invoice_for(dec!(5000), None).await;

    // Same shared state, but invoice updates fail after the payment and
    // wallet writes have already been staged
    let faulty = FaultyStore {
        inner: clinic.store.clone(),
        fail: FailPoint::UpdateInvoice,
        tripped: Arc::new(AtomicBool::new(false)),
    };
    let engine = SettlementEngine::new(Arc::new(faulty));

    let err = engine
        .apply_payment(clinic.pay(invoice.id, dec!(5000), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::OperationFailed(_)));

    // Nothing is observable: no payment, no debit, no ledger entry, no
    // invoice movement
    assert_eq!(clinic.store.payment_count().await, 0);
    assert_eq!(
        clinic.store.wallet_balance(wallet.id).await.unwrap().amount(),
        dec!(8000)
    );
    assert!(clinic.store.wallet_transactions(wallet.id).await.is_empty());
    let untouched = clinic.store.invoice(invoice.id).await.unwrap();
    assert_eq!(untouched.status, InvoiceStatus::Pending);
    assert!(untouched.paid_amount.is_zero());
}

#[tokio::test]
async fn test_payment_reference_collision_is_retried() {
    let clinic = clinic().await;
    let invoice = clinic.invoice_for(dec!(100), None).await;

    let faulty = FaultyStore {
        inner: clinic.store.clone(),
        fail: FailPoint::FirstInsertPayment,
        tripped: Arc::new(AtomicBool::new(false)),
    };
    let engine = SettlementEngine::new(Arc::new(faulty));

    let payment = engine
        .apply_payment(clinic.pay(invoice.id, dec!(100), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    assert!(payment.payment_reference.starts_with("PAY-"));
    assert_eq!(clinic.store.payment_count().await, 1);
    assert_eq!(
        clinic.store.invoice(invoice.id).await.unwrap().status,
        InvoiceStatus::Paid
    );
}

// ============================================================================
// Wallet top-up
// ============================================================================

#[tokio::test]
async fn test_top_up_then_wallet_settlement() {
    let clinic = clinic().await;
    let wallet = clinic.seed_wallet(dec!(0)).await;

    let top_up = clinic
        .engine
        .top_up_wallet(clinic.patient_id, dec!(6000), &clinic.actor)
        .await
        .unwrap();
    assert_eq!(top_up.amount.amount(), dec!(6000));
    assert_eq!(top_up.balance_after.amount(), dec!(6000));

    let invoice = clinic.invoice_for(dec!(5000), None).await;
    clinic
        .engine
        .apply_payment(clinic.pay(invoice.id, dec!(5000), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap();

    assert_eq!(
        clinic.store.wallet_balance(wallet.id).await.unwrap().amount(),
        dec!(1000)
    );

    let transactions = clinic.store.wallet_transactions(wallet.id).await;
    assert_eq!(transactions.len(), 2);
    for transaction in &transactions {
        assert_eq!(
            transaction.balance_after,
            transaction.balance_before + transaction.amount
        );
    }
}

#[tokio::test]
async fn test_top_up_rejects_non_positive_amount() {
    let clinic = clinic().await;
    clinic.seed_wallet(dec!(0)).await;

    let err = clinic
        .engine
        .top_up_wallet(clinic.patient_id, Decimal::ZERO, &clinic.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::InvalidAmount(_)));
}
