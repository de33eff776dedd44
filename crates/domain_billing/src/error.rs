//! Billing domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::MoneyError;

/// Errors that can occur in the billing domain
///
/// Validation and state errors are returned to the caller as-is. The
/// `DuplicateReference` and `Money` variants are internal: the settlement
/// engine either handles them (reference retry) or collapses them into a
/// generic `OperationFailed` before they cross the engine boundary.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Entity absent, soft-deleted, or belonging to another facility
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Illegal status transition
    #[error("{0}")]
    InvalidState(String),

    /// Non-positive or exceeds-outstanding payment amount
    #[error("{0}")]
    InvalidAmount(String),

    /// Wallet-funded payment without a wallet able to cover it
    #[error("Insufficient wallet balance")]
    InsufficientFunds,

    /// Malformed request content
    #[error("{0}")]
    Validation(String),

    /// Unique reference collision, retried by the engine
    #[error("Duplicate reference: {0}")]
    DuplicateReference(String),

    /// Money arithmetic error
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Unexpected failure; the operation was rolled back
    #[error("{0}")]
    OperationFailed(String),
}

impl BillingError {
    pub fn not_found(entity: &'static str) -> Self {
        BillingError::NotFound { entity }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        BillingError::InvalidState(message.into())
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        BillingError::InvalidAmount(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        BillingError::OperationFailed(message.into())
    }

    /// The rejection for a payment larger than what is still owed; the
    /// message reports both amounts at two decimal places
    pub fn amount_exceeds_outstanding(requested: Decimal, outstanding: Decimal) -> Self {
        BillingError::InvalidAmount(format!(
            "Payment amount ({:.2}) exceeds outstanding amount ({:.2})",
            requested, outstanding
        ))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::NotFound { .. })
    }

    /// Returns true for error kinds that are part of the caller-facing
    /// contract; everything else must be sanitized to `OperationFailed`
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            BillingError::NotFound { .. }
                | BillingError::InvalidState(_)
                | BillingError::InvalidAmount(_)
                | BillingError::InsufficientFunds
                | BillingError::Validation(_)
                | BillingError::OperationFailed(_)
        )
    }
}
