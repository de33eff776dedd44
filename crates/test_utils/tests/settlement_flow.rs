//! End-to-end settlement flows
//!
//! These tests walk whole clinical-financial journeys through the engine:
//! check-in, invoicing, cashier settlement, wallet funding, and the
//! workflow coupling between them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use domain_billing::{
    AppointmentStatus, BillingError, InvoiceFilter, InvoiceStatus, PageRequest, PaymentMethod,
};
use test_utils::assertions::{assert_invoice_consistent, assert_ledger_consistent, assert_money_eq};
use test_utils::builders::TestClinicBuilder;
use test_utils::init_tracing;

/// The canonical visit: checked-in patient, invoice raised at the desk,
/// settled in cash, visit proceeds to vitals.
#[tokio::test]
async fn test_checked_in_visit_settles_and_proceeds_to_vitals() {
    init_tracing();
    let clinic = TestClinicBuilder::new()
        .with_appointment(AppointmentStatus::CheckedIn)
        .build()
        .await;
    let appointment_id = clinic.appointment_id.unwrap();

    // Raising the invoice queues the visit at the cashier
    let invoice = clinic.invoice_for(&[dec!(5000)]).await;
    assert_invoice_consistent(&invoice);
    assert_eq!(
        clinic.store.appointment(appointment_id).await.unwrap().status,
        AppointmentStatus::AwaitingPayment
    );

    // Full settlement releases the visit to vitals
    clinic
        .engine
        .apply_payment(clinic.payment(&invoice, dec!(5000), PaymentMethod::Cash), &clinic.actor)
        .await
        .unwrap();

    let settled = clinic.store.invoice(invoice.id).await.unwrap();
    assert_invoice_consistent(&settled);
    assert_eq!(settled.status, InvoiceStatus::Paid);
    assert_eq!(
        clinic.store.appointment(appointment_id).await.unwrap().status,
        AppointmentStatus::AwaitingVitals
    );
}

/// Instalments keep the invariant at every step and only the final
/// instalment releases the visit.
#[tokio::test]
async fn test_instalments_settle_incrementally() {
    init_tracing();
    let clinic = TestClinicBuilder::new()
        .with_appointment(AppointmentStatus::AwaitingPayment)
        .build()
        .await;
    let appointment_id = clinic.appointment_id.unwrap();
    let invoice = clinic.invoice_for(&[dec!(3000), dec!(2000)]).await;

    for (amount, expected_status) in [
        (dec!(1500), InvoiceStatus::PartiallyPaid),
        (dec!(1500), InvoiceStatus::PartiallyPaid),
        (dec!(2000), InvoiceStatus::Paid),
    ] {
        clinic
            .engine
            .apply_payment(clinic.payment(&invoice, amount, PaymentMethod::Card), &clinic.actor)
            .await
            .unwrap();

        let current = clinic.store.invoice(invoice.id).await.unwrap();
        assert_invoice_consistent(&current);
        assert_eq!(current.status, expected_status);

        let appointment = clinic.store.appointment(appointment_id).await.unwrap();
        if expected_status == InvoiceStatus::Paid {
            assert_eq!(appointment.status, AppointmentStatus::AwaitingVitals);
        } else {
            assert_eq!(appointment.status, AppointmentStatus::AwaitingPayment);
        }
    }

    let payments = clinic
        .engine
        .list_payments_for_invoice(invoice.id, clinic.actor.facility_id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 3);
}

/// Wallet journey: top-up, spend, and a fully chained ledger trail.
#[tokio::test]
async fn test_wallet_top_up_and_settlement_leave_audit_trail() {
    init_tracing();
    let clinic = TestClinicBuilder::new().with_wallet(dec!(500)).build().await;
    let wallet_id = clinic.wallet_id.unwrap();

    clinic
        .engine
        .top_up_wallet(clinic.patient_id, dec!(4500), &clinic.actor)
        .await
        .unwrap();

    let invoice = clinic.invoice_for(&[dec!(3000)]).await;
    clinic
        .engine
        .apply_payment(clinic.payment(&invoice, dec!(3000), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap();

    let balance = clinic.store.wallet_balance(wallet_id).await.unwrap();
    assert_money_eq(&balance, dec!(2000));

    let trail = clinic.store.wallet_transactions(wallet_id).await;
    assert_eq!(trail.len(), 2);
    assert_ledger_consistent(&trail);
    assert_money_eq(&trail[0].amount, dec!(4500));
    assert_money_eq(&trail[1].amount, dec!(-3000));
}

/// A failed wallet settlement must leave no trace anywhere.
#[tokio::test]
async fn test_underfunded_wallet_settlement_is_a_clean_no_op() {
    init_tracing();
    let clinic = TestClinicBuilder::new().with_wallet(dec!(1000)).build().await;
    let wallet_id = clinic.wallet_id.unwrap();
    let invoice = clinic.invoice_for(&[dec!(5000)]).await;

    let err = clinic
        .engine
        .apply_payment(clinic.payment(&invoice, dec!(5000), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::InsufficientFunds));

    assert_money_eq(&clinic.store.wallet_balance(wallet_id).await.unwrap(), dec!(1000));
    assert!(clinic.store.wallet_transactions(wallet_id).await.is_empty());
    assert_eq!(clinic.store.payment_count().await, 0);

    let untouched = clinic.store.invoice(invoice.id).await.unwrap();
    assert_invoice_consistent(&untouched);
    assert_eq!(untouched.status, InvoiceStatus::Pending);
}

/// Cancelling after a partial payment freezes the financial state: the
/// paid amount stays on the record and the ledger is not reversed.
#[tokio::test]
async fn test_cancellation_after_partial_payment_is_irreversible() {
    init_tracing();
    let clinic = TestClinicBuilder::new().with_wallet(dec!(5000)).build().await;
    let wallet_id = clinic.wallet_id.unwrap();
    let invoice = clinic.invoice_for(&[dec!(4000)]).await;

    clinic
        .engine
        .apply_payment(clinic.payment(&invoice, dec!(1500), PaymentMethod::Wallet), &clinic.actor)
        .await
        .unwrap();
    clinic
        .engine
        .cancel_invoice(invoice.id, clinic.actor.facility_id, &clinic.actor)
        .await
        .unwrap();

    let cancelled = clinic.store.invoice(invoice.id).await.unwrap();
    assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
    assert_money_eq(&cancelled.paid_amount, dec!(1500));

    // The wallet debit stands; refunds are a manual, separate process
    assert_money_eq(&clinic.store.wallet_balance(wallet_id).await.unwrap(), dec!(3500));
    assert_eq!(clinic.store.wallet_transactions(wallet_id).await.len(), 1);
}

/// Catalog services price the lines and name them on the invoice.
#[tokio::test]
async fn test_catalog_service_names_invoice_lines() {
    init_tracing();
    let clinic = TestClinicBuilder::new()
        .with_service("General Consultation", dec!(5000))
        .build()
        .await;
    let service_id = clinic.service_ids[0];

    let invoice = clinic
        .engine
        .create_invoice(
            domain_billing::CreateInvoiceRequest {
                patient_id: clinic.patient_id,
                appointment_id: None,
                discount_percentage: dec!(10),
                notes: Some("Walk-in".to_string()),
                items: vec![domain_billing::CreateInvoiceItemRequest {
                    service_id: Some(service_id),
                    description: String::new(),
                    quantity: 1,
                    unit_price: dec!(5000),
                    discount_amount: Decimal::ZERO,
                }],
            },
            &clinic.actor,
        )
        .await
        .unwrap();

    assert_eq!(invoice.items[0].description, "General Consultation");
    assert_money_eq(&invoice.subtotal, dec!(5000));
    assert_money_eq(&invoice.discount_amount, dec!(500));
    assert_money_eq(&invoice.total_amount, dec!(4500));
    assert_invoice_consistent(&invoice);
}

/// Listing pages through a patient's invoices newest-first.
#[tokio::test]
async fn test_invoice_listing_pages_newest_first() {
    init_tracing();
    let clinic = TestClinicBuilder::new().build().await;

    for amount in [dec!(100), dec!(200), dec!(300), dec!(400), dec!(500)] {
        clinic.invoice_for(&[amount]).await;
    }

    let first_page = clinic
        .engine
        .list_invoices(
            clinic.actor.facility_id,
            &InvoiceFilter::for_patient(clinic.patient_id),
            &PageRequest::new(1, 2),
        )
        .await
        .unwrap();

    assert_eq!(first_page.total_count, 5);
    assert_eq!(first_page.total_pages, 3);
    assert_eq!(first_page.items.len(), 2);
    assert!(first_page.items[0].invoice_date >= first_page.items[1].invoice_date);

    let last_page = clinic
        .engine
        .list_invoices(
            clinic.actor.facility_id,
            &InvoiceFilter::for_patient(clinic.patient_id),
            &PageRequest::new(3, 2),
        )
        .await
        .unwrap();
    assert_eq!(last_page.items.len(), 1);
}

/// Another facility sees none of it.
#[tokio::test]
async fn test_other_facilities_see_nothing() {
    init_tracing();
    let clinic = TestClinicBuilder::new().build().await;
    let invoice = clinic.invoice_for(&[dec!(100)]).await;
    let outsider = test_utils::fixtures::ActorFixtures::outsider();

    let err = clinic
        .engine
        .get_invoice(invoice.id, outsider.facility_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let listing = clinic
        .engine
        .list_invoices(
            outsider.facility_id,
            &InvoiceFilter::default(),
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(listing.total_count, 0);
}
