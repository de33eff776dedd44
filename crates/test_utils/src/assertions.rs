//! Domain-aware assertion helpers
//!
//! These check the billing invariants as a whole and produce meaningful
//! messages when one is violated.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_billing::{Invoice, InvoiceStatus, WalletTransaction};

/// Asserts a money value equals the expected raw amount
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money mismatch: actual={}, expected={}",
        actual.amount(),
        expected
    );
}

/// Asserts the invoice bookkeeping invariant: `0 <= paid <= total` and the
/// status agrees with the paid amount
pub fn assert_invoice_consistent(invoice: &Invoice) {
    assert!(
        !invoice.paid_amount.is_negative(),
        "Invoice {} has negative paid amount {}",
        invoice.invoice_number,
        invoice.paid_amount
    );
    assert!(
        invoice.paid_amount <= invoice.total_amount,
        "Invoice {} is over-paid: paid={}, total={}",
        invoice.invoice_number,
        invoice.paid_amount,
        invoice.total_amount
    );

    match invoice.status {
        InvoiceStatus::Paid => assert!(
            invoice.paid_amount >= invoice.total_amount,
            "Invoice {} marked Paid but paid={} < total={}",
            invoice.invoice_number,
            invoice.paid_amount,
            invoice.total_amount
        ),
        InvoiceStatus::PartiallyPaid => assert!(
            invoice.paid_amount.is_positive() && invoice.paid_amount < invoice.total_amount,
            "Invoice {} marked PartiallyPaid but paid={}, total={}",
            invoice.invoice_number,
            invoice.paid_amount,
            invoice.total_amount
        ),
        InvoiceStatus::Pending | InvoiceStatus::Draft => assert!(
            invoice.paid_amount.is_zero(),
            "Invoice {} is {:?} but paid={}",
            invoice.invoice_number,
            invoice.status,
            invoice.paid_amount
        ),
        // A cancelled or refunded invoice keeps whatever was paid before
        InvoiceStatus::Cancelled | InvoiceStatus::Refunded => {}
    }
}

/// Asserts the ledger integrity invariant over a transaction history:
/// every entry snapshots the balance it moved, and consecutive entries
/// chain (each `balance_before` equals the previous `balance_after`)
pub fn assert_ledger_consistent(transactions: &[WalletTransaction]) {
    for transaction in transactions {
        assert_eq!(
            transaction.balance_after,
            transaction.balance_before + transaction.amount,
            "Ledger entry {} does not satisfy balance_after == balance_before + amount",
            transaction.id
        );
        assert!(
            !transaction.balance_after.is_negative(),
            "Ledger entry {} left a negative balance",
            transaction.id
        );
    }

    for pair in transactions.windows(2) {
        assert_eq!(
            pair[1].balance_before, pair[0].balance_after,
            "Ledger entries {} and {} do not chain",
            pair[0].id, pair[1].id
        );
    }
}
