//! Payment records
//!
//! A payment is written exactly once per successful settlement attempt and
//! never mutated. A failed attempt produces no record at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ActorContext, ActorId, InvoiceId, Money, PaymentId};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash at the front desk
    Cash,
    /// Card terminal
    Card,
    /// Bank transfer
    BankTransfer,
    /// Patient's internal wallet
    Wallet,
    /// Insurance settlement
    Insurance,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Insurance => "insurance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "wallet" => Some(PaymentMethod::Wallet),
            "insurance" => Some(PaymentMethod::Insurance),
            _ => None,
        }
    }
}

/// Payment status
///
/// The engine only ever persists `Completed`; the remaining variants exist
/// for records imported from upstream systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// A settled payment against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Human-readable reference, unique across the platform
    pub payment_reference: String,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    /// Payment amount
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// Status
    pub status: PaymentStatus,
    /// When the payment was taken
    pub payment_date: DateTime<Utc>,
    /// Opaque external transaction id (terminal, gateway, bank)
    pub transaction_id: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Actor who processed the payment
    pub processed_by: ActorId,
    /// Soft-delete marker
    pub is_deleted: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Actor display name recorded for audit
    pub created_by: String,
}

impl Payment {
    /// Creates a completed payment for a successful settlement
    pub fn completed(
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        actor: &ActorContext,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new_v7(),
            payment_reference: generate_payment_reference(),
            invoice_id,
            amount,
            method,
            status: PaymentStatus::Completed,
            payment_date: now,
            transaction_id: None,
            notes: None,
            processed_by: actor.actor_id,
            is_deleted: false,
            created_at: now,
            created_by: actor.actor_name.clone(),
        }
    }

    /// Sets the external transaction id
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Attaches notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Generates a payment reference: `PAY-<YYYYMMDD>-<8 uppercase hex>`
///
/// Collisions are handled by the persistence layer's unique constraint and
/// the engine's retry loop.
pub(crate) fn generate_payment_reference() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "PAY-{}-{}",
        Utc::now().format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}
