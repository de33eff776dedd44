//! Test scenario builders
//!
//! Builds a seeded clinic (patient, wallet, appointment, catalog services)
//! over the in-memory store and hands back a ready settlement engine, so
//! tests specify only the fields they care about.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use core_kernel::{ActorContext, AppointmentId, Currency, Money, PatientId, ServiceId, WalletId};
use domain_billing::adapters::{MemoryStore, PatientRecord};
use domain_billing::{
    Appointment, AppointmentStatus, ApplyPaymentRequest, CreateInvoiceItemRequest,
    CreateInvoiceRequest, Invoice, PaymentMethod, ServiceRef, SettlementEngine, Wallet,
};

use crate::fixtures::ActorFixtures;

/// Builder for a seeded test clinic
pub struct TestClinicBuilder {
    wallet_balance: Option<Decimal>,
    appointment_status: Option<AppointmentStatus>,
    services: Vec<(String, Decimal)>,
}

impl Default for TestClinicBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClinicBuilder {
    pub fn new() -> Self {
        Self {
            wallet_balance: None,
            appointment_status: None,
            services: Vec::new(),
        }
    }

    /// Gives the patient a wallet with the given opening balance
    pub fn with_wallet(mut self, balance: Decimal) -> Self {
        self.wallet_balance = Some(balance);
        self
    }

    /// Adds an appointment for the patient in the given status
    pub fn with_appointment(mut self, status: AppointmentStatus) -> Self {
        self.appointment_status = Some(status);
        self
    }

    /// Adds a catalog service
    pub fn with_service(mut self, name: impl Into<String>, price: Decimal) -> Self {
        self.services.push((name.into(), price));
        self
    }

    /// Seeds the store and builds the engine
    pub async fn build(self) -> TestClinic {
        let store = MemoryStore::new();
        let actor = ActorFixtures::cashier();
        let patient_id = PatientId::new();

        store
            .seed_patient(PatientRecord {
                id: patient_id,
                facility_id: actor.facility_id,
                full_name: "Ada Obi".to_string(),
                is_deleted: false,
            })
            .await;

        let mut wallet_id = None;
        if let Some(balance) = self.wallet_balance {
            let wallet =
                Wallet::with_balance(patient_id, Money::new(balance, Currency::NGN));
            wallet_id = Some(wallet.id);
            store.seed_wallet(wallet).await;
        }

        let mut appointment_id = None;
        if let Some(status) = self.appointment_status {
            let appointment =
                Appointment::new(actor.facility_id, patient_id, status, Utc::now());
            appointment_id = Some(appointment.id);
            store.seed_appointment(appointment).await;
        }

        let mut service_ids = Vec::new();
        for (name, price) in self.services {
            let service = ServiceRef {
                id: ServiceId::new(),
                name,
                price: Money::new(price, Currency::NGN),
            };
            service_ids.push(service.id);
            store.seed_service(service).await;
        }

        let engine = SettlementEngine::new(Arc::new(store.clone()));
        TestClinic {
            store,
            engine,
            actor,
            patient_id,
            wallet_id,
            appointment_id,
            service_ids,
        }
    }
}

/// A seeded clinic with its settlement engine
pub struct TestClinic {
    pub store: MemoryStore,
    pub engine: SettlementEngine,
    pub actor: ActorContext,
    pub patient_id: PatientId,
    pub wallet_id: Option<WalletId>,
    pub appointment_id: Option<AppointmentId>,
    pub service_ids: Vec<ServiceId>,
}

impl TestClinic {
    /// Creates an invoice with one ad-hoc line per amount, linked to the
    /// seeded appointment when there is one
    pub async fn invoice_for(&self, amounts: &[Decimal]) -> Invoice {
        let items = amounts
            .iter()
            .map(|amount| CreateInvoiceItemRequest {
                service_id: None,
                description: "Service rendered".to_string(),
                quantity: 1,
                unit_price: *amount,
                discount_amount: Decimal::ZERO,
            })
            .collect();

        self.engine
            .create_invoice(
                CreateInvoiceRequest {
                    patient_id: self.patient_id,
                    appointment_id: self.appointment_id,
                    discount_percentage: Decimal::ZERO,
                    notes: None,
                    items,
                },
                &self.actor,
            )
            .await
            .expect("invoice creation failed")
    }

    /// Builds a payment request against an invoice
    pub fn payment(
        &self,
        invoice: &Invoice,
        amount: Decimal,
        method: PaymentMethod,
    ) -> ApplyPaymentRequest {
        ApplyPaymentRequest {
            invoice_id: invoice.id,
            amount,
            method,
            transaction_id: None,
            notes: None,
        }
    }
}
