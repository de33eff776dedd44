//! Patient wallets
//!
//! Each patient owns at most one wallet. The balance moves only through the
//! ledger operations in [`crate::ledger`]; every movement appends a
//! [`WalletTransaction`] carrying a before/after snapshot of the balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, PatientId, WalletId, WalletTransactionId};

/// A patient's wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier
    pub id: WalletId,
    /// Owning patient (1:1)
    pub patient_id: PatientId,
    /// Current balance, never negative
    pub balance: Money,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates an empty wallet for a patient
    pub fn new(patient_id: PatientId, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new_v7(),
            patient_id,
            balance: Money::zero(currency),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a wallet with an opening balance
    pub fn with_balance(patient_id: PatientId, balance: Money) -> Self {
        let mut wallet = Self::new(patient_id, balance.currency());
        wallet.balance = balance;
        wallet
    }

    /// Returns the wallet currency
    pub fn currency(&self) -> Currency {
        self.balance.currency()
    }
}

/// The direction/purpose of a wallet movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletTransactionType {
    /// Funds added to the wallet
    TopUp,
    /// Funds spent settling an invoice
    Payment,
}

impl WalletTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionType::TopUp => "TOP_UP",
            WalletTransactionType::Payment => "PAYMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TOP_UP" => Some(WalletTransactionType::TopUp),
            "PAYMENT" => Some(WalletTransactionType::Payment),
            _ => None,
        }
    }
}

/// An append-only record of one wallet balance change
///
/// Never mutated or deleted; the full history is the audit trail of every
/// balance the wallet has held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Unique identifier
    pub id: WalletTransactionId,
    /// Owning wallet
    pub wallet_id: WalletId,
    /// Signed amount: positive credit, negative debit
    pub amount: Money,
    /// Movement type
    pub transaction_type: WalletTransactionType,
    /// Human-readable description
    pub description: Option<String>,
    /// External reference (e.g. the settled invoice number)
    pub reference: Option<String>,
    /// Balance before this movement
    pub balance_before: Money,
    /// Balance after this movement (= before + amount)
    pub balance_after: Money,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Actor display name recorded for audit
    pub created_by: String,
}
