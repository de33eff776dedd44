//! Invoice aggregate
//!
//! An invoice freezes its line items at creation time; afterwards only the
//! settlement engine may move `paid_amount` and `status`, and cancellation
//! may mark it `Cancelled`. Invoices are soft-marked, never deleted.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{AppointmentId, Currency, FacilityId, InvoiceId, Money, PatientId, Rate, ServiceId};

use crate::error::BillingError;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Captured but not yet issued
    Draft,
    /// Issued, awaiting payment
    Pending,
    /// Partial payment received
    PartiallyPaid,
    /// Fully settled
    Paid,
    /// Voided before full settlement
    Cancelled,
    /// Refunded through manual handling
    Refunded,
}

impl InvoiceStatus {
    /// Text form used on database rows
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "pending" => Some(InvoiceStatus::Pending),
            "partially_paid" => Some(InvoiceStatus::PartiallyPaid),
            "paid" => Some(InvoiceStatus::Paid),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            "refunded" => Some(InvoiceStatus::Refunded),
            _ => None,
        }
    }
}

/// A line item on an invoice, immutable after invoice creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Item ID
    pub id: Uuid,
    /// Owning invoice
    pub invoice_id: InvoiceId,
    /// Catalog service this line bills, if any
    pub service_id: Option<ServiceId>,
    /// Description (catalog service name when a service is referenced)
    pub description: String,
    /// Quantity billed
    pub quantity: u32,
    /// Unit price
    pub unit_price: Money,
    /// Per-item discount
    pub discount_amount: Money,
    /// quantity * unit_price - discount
    pub total_price: Money,
}

/// An invoice for rendered services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Human-readable invoice number, immutable once persisted
    pub invoice_number: String,
    /// Owning facility (tenant)
    pub facility_id: FacilityId,
    /// Patient being billed
    pub patient_id: PatientId,
    /// Linked appointment, if the invoice was raised for a visit
    pub appointment_id: Option<AppointmentId>,
    /// Issue date
    pub invoice_date: DateTime<Utc>,
    /// Payment due date
    pub due_date: Option<DateTime<Utc>>,
    /// Line items, frozen at creation
    pub items: Vec<InvoiceItem>,
    /// Sum of line totals
    pub subtotal: Money,
    /// Invoice-level discount percentage (0-100)
    pub discount_percentage: Decimal,
    /// subtotal * discount_percentage / 100
    pub discount_amount: Money,
    /// subtotal - discount_amount
    pub total_amount: Money,
    /// Amount settled so far
    pub paid_amount: Money,
    /// Invoice currency
    pub currency: Currency,
    /// Status
    pub status: InvoiceStatus,
    /// Free-form notes
    pub notes: Option<String>,
    /// Soft-delete marker
    pub is_deleted: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Actor who created the invoice
    pub created_by: String,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
    /// Actor of the last mutation
    pub updated_by: Option<String>,
}

impl Invoice {
    /// Returns the amount still owed, floored at zero
    pub fn outstanding_amount(&self) -> Money {
        let due = self.total_amount - self.paid_amount;
        if due.is_negative() {
            Money::zero(self.currency)
        } else {
            due
        }
    }

    /// Checks that the invoice can accept a payment
    pub fn ensure_payable(&self) -> Result<(), BillingError> {
        match self.status {
            InvoiceStatus::Pending | InvoiceStatus::PartiallyPaid => Ok(()),
            InvoiceStatus::Paid => Err(BillingError::invalid_state("Invoice is already paid")),
            InvoiceStatus::Cancelled => Err(BillingError::invalid_state(
                "Cannot process payment for a cancelled invoice",
            )),
            InvoiceStatus::Draft | InvoiceStatus::Refunded => Err(BillingError::invalid_state(
                "Invoice cannot accept payments in its current state",
            )),
        }
    }

    /// Checks a payment amount against the outstanding balance
    pub fn validate_payment_amount(&self, amount: &Money) -> Result<(), BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::invalid_amount(
                "Payment amount must be greater than 0",
            ));
        }
        let outstanding = self.outstanding_amount();
        if *amount > outstanding {
            return Err(BillingError::amount_exceeds_outstanding(
                amount.amount(),
                outstanding.amount(),
            ));
        }
        Ok(())
    }

    /// Applies a settled payment amount and recomputes the status
    ///
    /// Legal only from `Pending` or `PartiallyPaid`. `paid_amount` never
    /// decreases; the new status is `Paid` exactly when the updated
    /// `paid_amount` covers `total_amount`.
    pub fn record_payment(&mut self, amount: Money, by: &str) -> Result<InvoiceStatus, BillingError> {
        self.ensure_payable()?;
        self.validate_payment_amount(&amount)?;

        self.paid_amount = self.paid_amount.checked_add(&amount)?;
        self.status = if self.paid_amount >= self.total_amount {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::PartiallyPaid
        };
        self.touch(by);
        Ok(self.status)
    }

    /// Cancels the invoice
    ///
    /// Already-applied payments and wallet ledger entries are not reversed;
    /// cancellation after partial payment requires manual refund handling.
    pub fn cancel(&mut self, by: &str) -> Result<(), BillingError> {
        match self.status {
            InvoiceStatus::Paid => Err(BillingError::invalid_state("Cannot cancel a paid invoice")),
            InvoiceStatus::Cancelled => {
                Err(BillingError::invalid_state("Invoice is already cancelled"))
            }
            _ => {
                self.status = InvoiceStatus::Cancelled;
                self.touch(by);
                Ok(())
            }
        }
    }

    fn touch(&mut self, by: &str) {
        self.updated_at = Utc::now();
        self.updated_by = Some(by.to_string());
    }
}

/// A line-item request fed to the [`InvoiceBuilder`]
///
/// The description is expected to already carry the catalog service name
/// when `service_id` is set; the builder does no catalog lookups itself.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub service_id: Option<ServiceId>,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub discount: Money,
}

/// Builder for new invoices
///
/// Validates the line items, computes subtotal, discount, and total, and
/// produces an invoice in `Pending` status with a fresh invoice number.
pub struct InvoiceBuilder {
    patient_id: PatientId,
    facility_id: FacilityId,
    currency: Currency,
    appointment_id: Option<AppointmentId>,
    discount_percentage: Decimal,
    due_days: Option<i64>,
    notes: Option<String>,
    created_by: String,
    items: Vec<LineItem>,
}

impl InvoiceBuilder {
    /// Creates a builder for the given patient and facility
    pub fn new(patient_id: PatientId, facility_id: FacilityId, currency: Currency) -> Self {
        Self {
            patient_id,
            facility_id,
            currency,
            appointment_id: None,
            discount_percentage: Decimal::ZERO,
            due_days: None,
            notes: None,
            created_by: String::new(),
            items: Vec::new(),
        }
    }

    /// Links the invoice to an appointment
    pub fn appointment(mut self, appointment_id: AppointmentId) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    /// Sets the invoice-level discount percentage (0-100)
    pub fn discount_percentage(mut self, percentage: Decimal) -> Self {
        self.discount_percentage = percentage;
        self
    }

    /// Sets the payment terms in days from the issue date
    pub fn due_in_days(mut self, days: i64) -> Self {
        self.due_days = Some(days);
        self
    }

    /// Attaches free-form notes
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Records the creating actor
    pub fn created_by(mut self, actor_name: impl Into<String>) -> Self {
        self.created_by = actor_name.into();
        self
    }

    /// Adds a line item
    pub fn line_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    /// Validates the request and produces the invoice
    pub fn build(self) -> Result<Invoice, BillingError> {
        if self.items.is_empty() {
            return Err(BillingError::validation("At least one item is required"));
        }
        if self.discount_percentage < Decimal::ZERO || self.discount_percentage > dec!(100) {
            return Err(BillingError::validation(
                "Discount percentage must be between 0 and 100",
            ));
        }

        let id = InvoiceId::new_v7();
        let now = Utc::now();

        let mut items = Vec::with_capacity(self.items.len());
        let mut subtotal = Money::zero(self.currency);

        for line in self.items {
            if line.description.trim().is_empty() {
                return Err(BillingError::validation("Item description is required"));
            }
            if line.quantity == 0 {
                return Err(BillingError::validation("Quantity must be greater than 0"));
            }
            if line.unit_price.is_negative() {
                return Err(BillingError::validation("Unit price cannot be negative"));
            }
            if line.discount.is_negative() {
                return Err(BillingError::validation("Discount amount cannot be negative"));
            }

            let gross = line.unit_price.multiply(Decimal::from(line.quantity));
            let total_price = gross.checked_sub(&line.discount)?;
            if total_price.is_negative() {
                return Err(BillingError::validation(
                    "Discount amount cannot exceed the line total",
                ));
            }

            subtotal = subtotal.checked_add(&total_price)?;
            items.push(InvoiceItem {
                id: Uuid::new_v4(),
                invoice_id: id,
                service_id: line.service_id,
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount_amount: line.discount,
                total_price,
            });
        }

        let discount_amount = Rate::from_percentage(self.discount_percentage).apply(&subtotal);
        let total_amount = subtotal.checked_sub(&discount_amount)?;

        Ok(Invoice {
            id,
            invoice_number: generate_invoice_number(),
            facility_id: self.facility_id,
            patient_id: self.patient_id,
            appointment_id: self.appointment_id,
            invoice_date: now,
            due_date: self.due_days.map(|days| now + Duration::days(days)),
            items,
            subtotal,
            discount_percentage: self.discount_percentage,
            discount_amount,
            total_amount,
            paid_amount: Money::zero(self.currency),
            currency: self.currency,
            status: InvoiceStatus::Pending,
            notes: self.notes,
            is_deleted: false,
            created_at: now,
            created_by: self.created_by,
            updated_at: now,
            updated_by: None,
        })
    }
}

/// Generates an invoice number: `INV-<YYYYMMDD>-<8 uppercase hex>`
///
/// Uniqueness is probabilistic; the persistence layer enforces a unique
/// constraint and the engine retries on collision.
pub(crate) fn generate_invoice_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "INV-{}-{}",
        Utc::now().format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}
