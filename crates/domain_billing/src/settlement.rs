//! Settlement engine
//!
//! The orchestrator for everything that moves money. Each operation opens a
//! unit of work on the store, performs its reads and writes inside it, and
//! either commits everything or rolls everything back; no partial mutation
//! is ever observable.
//!
//! Validation and state errors travel back to the caller as typed
//! [`BillingError`] values. Anything unexpected is logged here with full
//! context and collapsed into a generic `OperationFailed` so that internal
//! detail never crosses the engine boundary.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use core_kernel::{ActorContext, Currency, FacilityId, InvoiceId, Money, PatientId, PaymentId};

use crate::error::BillingError;
use crate::invoice::{self, Invoice, InvoiceBuilder, InvoiceStatus, LineItem};
use crate::ledger;
use crate::payment::{self, Payment, PaymentMethod};
use crate::ports::{BillingStore, BillingUnitOfWork, SettlementView};
use crate::requests::{ApplyPaymentRequest, CreateInvoiceRequest, InvoiceFilter, Page, PageRequest};
use crate::wallet::WalletTransaction;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Deployment currency; every invoice, payment, and wallet uses it
    pub currency: Currency,
    /// Payment terms applied to new invoices
    pub invoice_due_days: i64,
    /// How many times a colliding invoice/payment reference is regenerated
    pub reference_retry_limit: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::NGN,
            invoice_due_days: 30,
            reference_retry_limit: 3,
        }
    }
}

/// The billing and settlement coordinator
pub struct SettlementEngine {
    store: Arc<dyn BillingStore>,
    config: BillingConfig,
}

impl SettlementEngine {
    /// Creates an engine with default configuration
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self::with_config(store, BillingConfig::default())
    }

    /// Creates an engine with explicit configuration
    pub fn with_config(store: Arc<dyn BillingStore>, config: BillingConfig) -> Self {
        Self { store, config }
    }

    /// Creates an invoice for rendered services
    ///
    /// Line items referencing a catalog service take the service's name as
    /// their description. If the invoice is linked to a checked-in
    /// appointment, the appointment advances to awaiting-payment in the
    /// same unit of work.
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
        actor: &ActorContext,
    ) -> Result<Invoice, BillingError> {
        request.validate()?;

        let mut uow = self.store.begin().await?;
        let result = self.create_invoice_in(uow.as_mut(), &request, actor).await;
        self.finish(
            uow,
            result,
            "An error occurred while creating the invoice",
        )
        .await
    }

    async fn create_invoice_in(
        &self,
        uow: &mut dyn BillingUnitOfWork,
        request: &CreateInvoiceRequest,
        actor: &ActorContext,
    ) -> Result<Invoice, BillingError> {
        let patient = uow
            .patient_with_wallet(request.patient_id, actor.facility_id)
            .await?
            .ok_or_else(|| {
                warn!(patient_id = %request.patient_id, "Patient not found");
                BillingError::not_found("Patient")
            })?;

        let mut appointment = None;
        if let Some(appointment_id) = request.appointment_id {
            let found = uow
                .appointment(appointment_id, actor.facility_id)
                .await?
                .ok_or_else(|| {
                    warn!(appointment_id = %appointment_id, "Appointment not found");
                    BillingError::not_found("Appointment")
                })?;
            appointment = Some(found);
        }

        let mut builder = InvoiceBuilder::new(patient.id, actor.facility_id, self.config.currency)
            .discount_percentage(request.discount_percentage)
            .due_in_days(self.config.invoice_due_days)
            .created_by(&actor.actor_name);
        if let Some(notes) = &request.notes {
            builder = builder.notes(notes.clone());
        }
        if let Some(appointment) = &appointment {
            builder = builder.appointment(appointment.id);
        }

        for item in &request.items {
            let mut description = item.description.clone();
            if let Some(service_id) = item.service_id {
                if let Some(service) = uow.service(service_id).await? {
                    description = service.name;
                }
            }
            builder = builder.line_item(LineItem {
                service_id: item.service_id,
                description,
                quantity: item.quantity,
                unit_price: Money::new(item.unit_price, self.config.currency),
                discount: Money::new(item.discount_amount, self.config.currency),
            });
        }

        let mut new_invoice = builder.build()?;
        let mut attempts = 0;
        loop {
            match uow.insert_invoice(&new_invoice).await {
                Ok(()) => break,
                Err(BillingError::DuplicateReference(reference))
                    if attempts < self.config.reference_retry_limit =>
                {
                    attempts += 1;
                    warn!(%reference, attempts, "Invoice number collision, regenerating");
                    new_invoice.invoice_number = invoice::generate_invoice_number();
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(mut appointment) = appointment {
            if appointment.on_invoice_created(&actor.actor_name) {
                uow.update_appointment(&appointment).await?;
                info!(
                    appointment_id = %appointment.id,
                    "Appointment moved to awaiting payment after invoice creation"
                );
            }
        }

        info!(
            invoice_id = %new_invoice.id,
            invoice_number = %new_invoice.invoice_number,
            patient_id = %new_invoice.patient_id,
            total_amount = %new_invoice.total_amount,
            created_by = %actor.actor_name,
            "Invoice created"
        );

        Ok(new_invoice)
    }

    /// Applies a payment to an invoice
    ///
    /// The whole operation - wallet debit (for wallet-funded payments),
    /// payment record, invoice status, appointment coupling - commits
    /// atomically or not at all. Returns the created payment.
    pub async fn apply_payment(
        &self,
        request: ApplyPaymentRequest,
        actor: &ActorContext,
    ) -> Result<Payment, BillingError> {
        request.validate()?;

        let mut uow = self.store.begin().await?;
        let result = self.apply_payment_in(uow.as_mut(), &request, actor).await;
        let outcome = self
            .finish(
                uow,
                result,
                "An error occurred while processing the payment",
            )
            .await;

        match &outcome {
            Ok(created) => info!(
                payment_id = %created.id,
                payment_reference = %created.payment_reference,
                invoice_id = %request.invoice_id,
                amount = %created.amount,
                method = ?request.method,
                actor = %actor.actor_name,
                "Payment processed"
            ),
            Err(err) => warn!(
                invoice_id = %request.invoice_id,
                amount = %request.amount,
                method = ?request.method,
                actor = %actor.actor_name,
                error = %err,
                "Payment rejected"
            ),
        }

        outcome
    }

    async fn apply_payment_in(
        &self,
        uow: &mut dyn BillingUnitOfWork,
        request: &ApplyPaymentRequest,
        actor: &ActorContext,
    ) -> Result<Payment, BillingError> {
        let SettlementView {
            mut invoice,
            wallet,
            appointment,
        } = uow
            .invoice_for_update(request.invoice_id, actor.facility_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Invoice"))?;

        invoice.ensure_payable()?;

        let amount = Money::new(request.amount, invoice.currency);
        invoice.validate_payment_amount(&amount)?;

        if request.method == PaymentMethod::Wallet {
            let mut wallet = wallet.ok_or(BillingError::InsufficientFunds)?;
            let transaction = ledger::debit(
                &mut wallet,
                amount,
                format!("Payment for invoice {}", invoice.invoice_number),
                request.transaction_id.clone(),
                &actor.actor_name,
            )?;
            uow.update_wallet(&wallet).await?;
            uow.insert_wallet_transaction(&transaction).await?;
        }

        let mut created = Payment::completed(invoice.id, amount, request.method, actor);
        if let Some(transaction_id) = &request.transaction_id {
            created = created.with_transaction_id(transaction_id.clone());
        }
        if let Some(notes) = &request.notes {
            created = created.with_notes(notes.clone());
        }

        let mut attempts = 0;
        loop {
            match uow.insert_payment(&created).await {
                Ok(()) => break,
                Err(BillingError::DuplicateReference(reference))
                    if attempts < self.config.reference_retry_limit =>
                {
                    attempts += 1;
                    warn!(%reference, attempts, "Payment reference collision, regenerating");
                    created.payment_reference = payment::generate_payment_reference();
                }
                Err(err) => return Err(err),
            }
        }

        let new_status = invoice.record_payment(amount, &actor.actor_name)?;
        uow.update_invoice(&invoice).await?;

        if new_status == InvoiceStatus::Paid {
            if let Some(mut appointment) = appointment {
                if appointment.on_invoice_settled(&actor.actor_name) {
                    uow.update_appointment(&appointment).await?;
                    info!(
                        appointment_id = %appointment.id,
                        "Appointment moved to awaiting vitals after full settlement"
                    );
                }
            }
        }

        Ok(created)
    }

    /// Cancels an invoice
    ///
    /// Payments and wallet ledger entries already applied are not reversed;
    /// cancelling a partially paid invoice is an irreversible financial
    /// state that requires manual refund handling.
    pub async fn cancel_invoice(
        &self,
        id: InvoiceId,
        facility_id: FacilityId,
        actor: &ActorContext,
    ) -> Result<(), BillingError> {
        let mut uow = self.store.begin().await?;
        let result = async {
            let view = uow
                .invoice_for_update(id, facility_id)
                .await?
                .ok_or_else(|| BillingError::not_found("Invoice"))?;

            let mut invoice = view.invoice;
            invoice.cancel(&actor.actor_name)?;
            uow.update_invoice(&invoice).await?;

            info!(
                invoice_id = %invoice.id,
                invoice_number = %invoice.invoice_number,
                cancelled_by = %actor.actor_name,
                "Invoice cancelled"
            );
            Ok(())
        }
        .await;

        self.finish(
            uow,
            result,
            "An error occurred while cancelling the invoice",
        )
        .await
    }

    /// Credits a patient's wallet
    pub async fn top_up_wallet(
        &self,
        patient_id: PatientId,
        amount: Decimal,
        actor: &ActorContext,
    ) -> Result<WalletTransaction, BillingError> {
        if amount <= Decimal::ZERO {
            return Err(BillingError::invalid_amount(
                "Top-up amount must be greater than 0",
            ));
        }

        let mut uow = self.store.begin().await?;
        let result = async {
            let patient = uow
                .patient_with_wallet(patient_id, actor.facility_id)
                .await?
                .ok_or_else(|| BillingError::not_found("Patient"))?;
            let mut wallet = patient
                .wallet
                .ok_or_else(|| BillingError::not_found("Wallet"))?;

            let currency = wallet.currency();
            let transaction = ledger::credit(
                &mut wallet,
                Money::new(amount, currency),
                "Wallet top-up",
                None,
                &actor.actor_name,
            )?;
            uow.update_wallet(&wallet).await?;
            uow.insert_wallet_transaction(&transaction).await?;

            info!(
                patient_id = %patient_id,
                amount = %transaction.amount,
                balance = %wallet.balance,
                "Wallet topped up"
            );
            Ok(transaction)
        }
        .await;

        self.finish(uow, result, "An error occurred while topping up the wallet")
            .await
    }

    /// Loads an invoice by id within the calling facility
    pub async fn get_invoice(
        &self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Invoice, BillingError> {
        self.store
            .get_invoice(id, facility_id)
            .await
            .map_err(|err| self.sanitize(err, "An error occurred while retrieving the invoice"))?
            .ok_or_else(|| BillingError::not_found("Invoice"))
    }

    /// Lists invoices, newest first
    pub async fn list_invoices(
        &self,
        facility_id: FacilityId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> Result<Page<Invoice>, BillingError> {
        self.store
            .list_invoices(facility_id, filter, page)
            .await
            .map_err(|err| self.sanitize(err, "An error occurred while retrieving invoices"))
    }

    /// Loads a payment by id within the calling facility
    pub async fn get_payment(
        &self,
        id: PaymentId,
        facility_id: FacilityId,
    ) -> Result<Payment, BillingError> {
        self.store
            .get_payment(id, facility_id)
            .await
            .map_err(|err| self.sanitize(err, "An error occurred while retrieving the payment"))?
            .ok_or_else(|| BillingError::not_found("Payment"))
    }

    /// Lists the payments applied to an invoice, newest first
    pub async fn list_payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Vec<Payment>, BillingError> {
        // Invoice existence doubles as the tenant check for its payments
        self.store
            .get_invoice(invoice_id, facility_id)
            .await
            .map_err(|err| self.sanitize(err, "An error occurred while retrieving payments"))?
            .ok_or_else(|| BillingError::not_found("Invoice"))?;

        self.store
            .list_payments_for_invoice(invoice_id)
            .await
            .map_err(|err| self.sanitize(err, "An error occurred while retrieving payments"))
    }

    /// Commits on success, rolls back on failure, and keeps internal error
    /// kinds from leaking to the caller
    async fn finish<T>(
        &self,
        uow: Box<dyn BillingUnitOfWork>,
        result: Result<T, BillingError>,
        failure_message: &str,
    ) -> Result<T, BillingError> {
        match result {
            Ok(value) => match uow.commit().await {
                Ok(()) => Ok(value),
                Err(err) => {
                    error!(error = %err, "Commit failed");
                    Err(BillingError::operation_failed(failure_message))
                }
            },
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(self.sanitize(err, failure_message))
            }
        }
    }

    fn sanitize(&self, err: BillingError, failure_message: &str) -> BillingError {
        if err.is_caller_facing() {
            err
        } else {
            error!(error = %err, "Unexpected billing failure");
            BillingError::operation_failed(failure_message)
        }
    }
}
