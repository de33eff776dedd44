//! Wallet ledger operations
//!
//! The ledger is stateless: both operations mutate the in-flight wallet the
//! caller holds inside its unit of work and hand back the transaction record
//! to append. Persisting both is the caller's job; neither is observable
//! until the surrounding unit of work commits.
//!
//! # Invariants
//!
//! - the balance never goes negative
//! - every record satisfies `balance_after == balance_before + amount`

use chrono::Utc;

use core_kernel::{Money, WalletTransactionId};

use crate::error::BillingError;
use crate::wallet::{Wallet, WalletTransaction, WalletTransactionType};

/// Debits the wallet, failing if the balance cannot cover the amount
///
/// The recorded transaction carries `amount = -amount` and the balance
/// snapshot around the movement.
pub fn debit(
    wallet: &mut Wallet,
    amount: Money,
    description: impl Into<String>,
    reference: Option<String>,
    by: &str,
) -> Result<WalletTransaction, BillingError> {
    if !amount.is_positive() {
        return Err(BillingError::invalid_amount(
            "Debit amount must be greater than 0",
        ));
    }

    let balance_before = wallet.balance;
    let balance_after = balance_before.checked_sub(&amount)?;
    if balance_after.is_negative() {
        return Err(BillingError::InsufficientFunds);
    }

    wallet.balance = balance_after;
    wallet.updated_at = Utc::now();

    Ok(record(
        wallet,
        -amount,
        WalletTransactionType::Payment,
        description.into(),
        reference,
        balance_before,
        by,
    ))
}

/// Credits the wallet; always succeeds for a positive amount
pub fn credit(
    wallet: &mut Wallet,
    amount: Money,
    description: impl Into<String>,
    reference: Option<String>,
    by: &str,
) -> Result<WalletTransaction, BillingError> {
    if !amount.is_positive() {
        return Err(BillingError::invalid_amount(
            "Credit amount must be greater than 0",
        ));
    }

    let balance_before = wallet.balance;
    wallet.balance = balance_before.checked_add(&amount)?;
    wallet.updated_at = Utc::now();

    Ok(record(
        wallet,
        amount,
        WalletTransactionType::TopUp,
        description.into(),
        reference,
        balance_before,
        by,
    ))
}

fn record(
    wallet: &Wallet,
    signed_amount: Money,
    transaction_type: WalletTransactionType,
    description: String,
    reference: Option<String>,
    balance_before: Money,
    by: &str,
) -> WalletTransaction {
    WalletTransaction {
        id: WalletTransactionId::new_v7(),
        wallet_id: wallet.id,
        amount: signed_amount,
        transaction_type,
        description: Some(description),
        reference,
        balance_before,
        balance_after: wallet.balance,
        created_at: Utc::now(),
        created_by: by.to_string(),
    }
}
