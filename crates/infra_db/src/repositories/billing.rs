//! PostgreSQL billing store
//!
//! Implements the `domain_billing` ports on PostgreSQL. Each unit of work is
//! a real database transaction; the settlement lookups take `FOR UPDATE`
//! row locks on the invoice, wallet, and appointment so concurrent
//! settlements against the same rows serialize instead of double-spending.
//! A `SET LOCAL lock_timeout` bounds every lock wait, and a transaction
//! dropped without commit rolls back on the server.
//!
//! Raw database detail never reaches callers: unique-constraint violations
//! map to the engine's duplicate-reference retry signal, everything else is
//! logged here and surfaced as a generic operation failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::error;
use uuid::Uuid;

use core_kernel::{
    ActorId, AppointmentId, Currency, FacilityId, InvoiceId, Money, PatientId, PaymentId,
    ServiceId, WalletId,
};
use domain_billing::{
    Appointment, AppointmentStatus, BillingError, BillingStore, BillingUnitOfWork, Invoice,
    InvoiceFilter, InvoiceItem, InvoiceStatus, Page, PageRequest, PatientRef, Payment,
    PaymentMethod, PaymentStatus, ServiceRef, SettlementView, Wallet, WalletTransaction,
};

use crate::error::DatabaseError;

/// PostgreSQL implementation of the billing store
#[derive(Debug, Clone)]
pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    /// Creates a store over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, BillingError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error(e, "begin"))?;

        // Bound every lock wait in this transaction; contention surfaces
        // as an error, never as a hang
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error(e, "begin"))?;

        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn get_invoice(
        &self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<Invoice>, BillingError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{INVOICE_SELECT} WHERE invoice_id = $1 AND facility_id = $2 AND is_deleted = FALSE"
        ))
        .bind(*id.as_uuid())
        .bind(*facility_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error(e, "get_invoice"))?;

        match row {
            Some(row) => {
                let items = fetch_items(&self.pool, row.invoice_id).await?;
                Ok(Some(map_invoice(row, items).map_err(data_error)?))
            }
            None => Ok(None),
        }
    }

    async fn list_invoices(
        &self,
        facility_id: FacilityId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> Result<Page<Invoice>, BillingError> {
        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM invoices WHERE facility_id = ");
        count_query.push_bind(*facility_id.as_uuid());
        count_query.push(" AND is_deleted = FALSE");
        push_filter(&mut count_query, filter);

        let total_count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error(e, "list_invoices"))?;

        let mut data_query = QueryBuilder::<Postgres>::new(format!(
            "{INVOICE_SELECT} WHERE facility_id = "
        ));
        data_query.push_bind(*facility_id.as_uuid());
        data_query.push(" AND is_deleted = FALSE");
        push_filter(&mut data_query, filter);
        data_query.push(" ORDER BY invoice_date DESC LIMIT ");
        data_query.push_bind(i64::from(page.page_size));
        data_query.push(" OFFSET ");
        data_query.push_bind(page.offset() as i64);

        let rows: Vec<InvoiceRow> = data_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error(e, "list_invoices"))?;

        let mut invoices = Vec::with_capacity(rows.len());
        for row in rows {
            let items = fetch_items(&self.pool, row.invoice_id).await?;
            invoices.push(map_invoice(row, items).map_err(data_error)?);
        }

        Ok(Page::new(invoices, page, total_count as u64))
    }

    async fn get_payment(
        &self,
        id: PaymentId,
        facility_id: FacilityId,
    ) -> Result<Option<Payment>, BillingError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "{PAYMENT_SELECT} \
             JOIN invoices i ON i.invoice_id = p.invoice_id \
             WHERE p.payment_id = $1 AND i.facility_id = $2 \
               AND p.is_deleted = FALSE AND i.is_deleted = FALSE"
        ))
        .bind(*id.as_uuid())
        .bind(*facility_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error(e, "get_payment"))?;

        row.map(|row| map_payment(row).map_err(data_error)).transpose()
    }

    async fn list_payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, BillingError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{PAYMENT_SELECT} \
             WHERE p.invoice_id = $1 AND p.is_deleted = FALSE \
             ORDER BY p.payment_date DESC"
        ))
        .bind(*invoice_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error(e, "list_payments"))?;

        rows.into_iter()
            .map(|row| map_payment(row).map_err(data_error))
            .collect()
    }
}

/// One database transaction implementing the unit-of-work port
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BillingUnitOfWork for PgUnitOfWork {
    async fn invoice_for_update(
        &mut self,
        id: InvoiceId,
        facility_id: FacilityId,
    ) -> Result<Option<SettlementView>, BillingError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{INVOICE_SELECT} WHERE invoice_id = $1 AND facility_id = $2 AND is_deleted = FALSE \
             FOR UPDATE"
        ))
        .bind(*id.as_uuid())
        .bind(*facility_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "invoice_for_update"))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let items = sqlx::query_as::<_, InvoiceItemRow>(
            "SELECT item_id, invoice_id, service_id, description, quantity, unit_price, \
                    discount_amount, total_price \
             FROM invoice_items WHERE invoice_id = $1 ORDER BY line_no",
        )
        .bind(row.invoice_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "invoice_for_update"))?;

        let wallet = sqlx::query_as::<_, WalletRow>(
            "SELECT w.wallet_id, w.patient_id, w.balance, w.currency, w.created_at, w.updated_at \
             FROM patient_wallets w \
             JOIN patients p ON p.patient_id = w.patient_id \
             WHERE w.patient_id = $1 AND p.is_deleted = FALSE \
             FOR UPDATE OF w",
        )
        .bind(row.patient_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "invoice_for_update"))?;

        let appointment = match row.appointment_id {
            Some(appointment_id) => sqlx::query_as::<_, AppointmentRow>(&format!(
                "{APPOINTMENT_SELECT} \
                 WHERE appointment_id = $1 AND is_deleted = FALSE FOR UPDATE"
            ))
            .bind(appointment_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| store_error(e, "invoice_for_update"))?,
            None => None,
        };

        Ok(Some(SettlementView {
            invoice: map_invoice(row, items).map_err(data_error)?,
            wallet: wallet.map(map_wallet).transpose().map_err(data_error)?,
            appointment: appointment.map(map_appointment).transpose().map_err(data_error)?,
        }))
    }

    async fn patient_with_wallet(
        &mut self,
        id: PatientId,
        facility_id: FacilityId,
    ) -> Result<Option<PatientRef>, BillingError> {
        let patient = sqlx::query_as::<_, PatientRow>(
            "SELECT patient_id, facility_id, full_name \
             FROM patients \
             WHERE patient_id = $1 AND facility_id = $2 AND is_deleted = FALSE",
        )
        .bind(*id.as_uuid())
        .bind(*facility_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "patient_with_wallet"))?;

        let patient = match patient {
            Some(patient) => patient,
            None => return Ok(None),
        };

        let wallet = sqlx::query_as::<_, WalletRow>(
            "SELECT wallet_id, patient_id, balance, currency, created_at, updated_at \
             FROM patient_wallets WHERE patient_id = $1 FOR UPDATE",
        )
        .bind(patient.patient_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "patient_with_wallet"))?;

        Ok(Some(PatientRef {
            id: PatientId::from_uuid(patient.patient_id),
            facility_id: FacilityId::from_uuid(patient.facility_id),
            full_name: patient.full_name,
            wallet: wallet.map(map_wallet).transpose().map_err(data_error)?,
        }))
    }

    async fn appointment(
        &mut self,
        id: AppointmentId,
        facility_id: FacilityId,
    ) -> Result<Option<Appointment>, BillingError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "{APPOINTMENT_SELECT} \
             WHERE appointment_id = $1 AND facility_id = $2 AND is_deleted = FALSE FOR UPDATE"
        ))
        .bind(*id.as_uuid())
        .bind(*facility_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "appointment"))?;

        row.map(|row| map_appointment(row).map_err(data_error)).transpose()
    }

    async fn service(&mut self, id: ServiceId) -> Result<Option<ServiceRef>, BillingError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT service_id, name, price, currency \
             FROM medical_services WHERE service_id = $1 AND is_deleted = FALSE",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "service"))?;

        row.map(|row| map_service(row).map_err(data_error)).transpose()
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError> {
        sqlx::query(
            "INSERT INTO invoices (invoice_id, invoice_number, facility_id, patient_id, \
             appointment_id, invoice_date, due_date, subtotal, discount_percentage, \
             discount_amount, total_amount, paid_amount, currency, status, notes, is_deleted, \
             created_at, created_by, updated_at, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20)",
        )
        .bind(*invoice.id.as_uuid())
        .bind(&invoice.invoice_number)
        .bind(*invoice.facility_id.as_uuid())
        .bind(*invoice.patient_id.as_uuid())
        .bind(invoice.appointment_id.map(|id| *id.as_uuid()))
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.subtotal.amount())
        .bind(invoice.discount_percentage)
        .bind(invoice.discount_amount.amount())
        .bind(invoice.total_amount.amount())
        .bind(invoice.paid_amount.amount())
        .bind(invoice.currency.code())
        .bind(invoice.status.as_str())
        .bind(&invoice.notes)
        .bind(invoice.is_deleted)
        .bind(invoice.created_at)
        .bind(&invoice.created_by)
        .bind(invoice.updated_at)
        .bind(&invoice.updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "insert_invoice"))?;

        for (line_no, item) in invoice.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO invoice_items (item_id, invoice_id, service_id, description, \
                 quantity, unit_price, discount_amount, total_price, line_no) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(item.id)
            .bind(*item.invoice_id.as_uuid())
            .bind(item.service_id.map(|id| *id.as_uuid()))
            .bind(&item.description)
            .bind(item.quantity as i32)
            .bind(item.unit_price.amount())
            .bind(item.discount_amount.amount())
            .bind(item.total_price.amount())
            .bind(line_no as i32)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error(e, "insert_invoice"))?;
        }

        Ok(())
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), BillingError> {
        sqlx::query(
            "UPDATE invoices \
             SET paid_amount = $2, status = $3, updated_at = $4, updated_by = $5 \
             WHERE invoice_id = $1",
        )
        .bind(*invoice.id.as_uuid())
        .bind(invoice.paid_amount.amount())
        .bind(invoice.status.as_str())
        .bind(invoice.updated_at)
        .bind(&invoice.updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "update_invoice"))?;
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), BillingError> {
        sqlx::query(
            "INSERT INTO payments (payment_id, payment_reference, invoice_id, amount, currency, \
             method, status, payment_date, transaction_id, notes, processed_by, is_deleted, \
             created_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(*payment.id.as_uuid())
        .bind(&payment.payment_reference)
        .bind(*payment.invoice_id.as_uuid())
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(payment.payment_date)
        .bind(&payment.transaction_id)
        .bind(&payment.notes)
        .bind(*payment.processed_by.as_uuid())
        .bind(payment.is_deleted)
        .bind(payment.created_at)
        .bind(&payment.created_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "insert_payment"))?;
        Ok(())
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<(), BillingError> {
        sqlx::query(
            "UPDATE patient_wallets SET balance = $2, updated_at = $3 WHERE wallet_id = $1",
        )
        .bind(*wallet.id.as_uuid())
        .bind(wallet.balance.amount())
        .bind(wallet.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "update_wallet"))?;
        Ok(())
    }

    async fn insert_wallet_transaction(
        &mut self,
        transaction: &WalletTransaction,
    ) -> Result<(), BillingError> {
        sqlx::query(
            "INSERT INTO wallet_transactions (transaction_id, wallet_id, amount, currency, \
             transaction_type, description, reference, balance_before, balance_after, \
             created_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(*transaction.id.as_uuid())
        .bind(*transaction.wallet_id.as_uuid())
        .bind(transaction.amount.amount())
        .bind(transaction.amount.currency().code())
        .bind(transaction.transaction_type.as_str())
        .bind(&transaction.description)
        .bind(&transaction.reference)
        .bind(transaction.balance_before.amount())
        .bind(transaction.balance_after.amount())
        .bind(transaction.created_at)
        .bind(&transaction.created_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "insert_wallet_transaction"))?;
        Ok(())
    }

    async fn update_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<(), BillingError> {
        sqlx::query(
            "UPDATE appointments SET status = $2, updated_at = $3, updated_by = $4 \
             WHERE appointment_id = $1",
        )
        .bind(*appointment.id.as_uuid())
        .bind(appointment.status.as_str())
        .bind(appointment.updated_at)
        .bind(&appointment.updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error(e, "update_appointment"))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), BillingError> {
        self.tx
            .commit()
            .await
            .map_err(|e| store_error(e, "commit"))
    }

    async fn rollback(self: Box<Self>) -> Result<(), BillingError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| store_error(e, "rollback"))
    }
}

// ============================================================================
// Rows and mapping
// ============================================================================

const INVOICE_SELECT: &str = "SELECT invoice_id, invoice_number, facility_id, patient_id, \
    appointment_id, invoice_date, due_date, subtotal, discount_percentage, discount_amount, \
    total_amount, paid_amount, currency, status, notes, is_deleted, created_at, created_by, \
    updated_at, updated_by FROM invoices";

const PAYMENT_SELECT: &str = "SELECT p.payment_id, p.payment_reference, p.invoice_id, \
    p.amount, p.currency, p.method, p.status, p.payment_date, p.transaction_id, p.notes, \
    p.processed_by, p.is_deleted, p.created_at, p.created_by FROM payments p";

const APPOINTMENT_SELECT: &str = "SELECT appointment_id, facility_id, patient_id, status, \
    scheduled_at, is_deleted, updated_at, updated_by FROM appointments";

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &InvoiceFilter) {
    if let Some(patient_id) = filter.patient_id {
        query.push(" AND patient_id = ");
        query.push_bind(*patient_id.as_uuid());
    }
    if let Some(start_date) = filter.start_date {
        query.push(" AND invoice_date::date >= ");
        query.push_bind(start_date);
    }
    if let Some(end_date) = filter.end_date {
        query.push(" AND invoice_date::date <= ");
        query.push_bind(end_date);
    }
}

async fn fetch_items(pool: &PgPool, invoice_id: Uuid) -> Result<Vec<InvoiceItemRow>, BillingError> {
    sqlx::query_as::<_, InvoiceItemRow>(
        "SELECT item_id, invoice_id, service_id, description, quantity, unit_price, \
         discount_amount, total_price \
         FROM invoice_items WHERE invoice_id = $1 ORDER BY line_no",
    )
    .bind(invoice_id)
    .fetch_all(pool)
    .await
    .map_err(|e| store_error(e, "fetch_items"))
}

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    invoice_id: Uuid,
    invoice_number: String,
    facility_id: Uuid,
    patient_id: Uuid,
    appointment_id: Option<Uuid>,
    invoice_date: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    subtotal: Decimal,
    discount_percentage: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    paid_amount: Decimal,
    currency: String,
    status: String,
    notes: Option<String>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    created_by: String,
    updated_at: DateTime<Utc>,
    updated_by: Option<String>,
}

#[derive(sqlx::FromRow)]
struct InvoiceItemRow {
    item_id: Uuid,
    invoice_id: Uuid,
    service_id: Option<Uuid>,
    description: String,
    quantity: i32,
    unit_price: Decimal,
    discount_amount: Decimal,
    total_price: Decimal,
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    payment_id: Uuid,
    payment_reference: String,
    invoice_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    status: String,
    payment_date: DateTime<Utc>,
    transaction_id: Option<String>,
    notes: Option<String>,
    processed_by: Uuid,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    created_by: String,
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    wallet_id: Uuid,
    patient_id: Uuid,
    balance: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AppointmentRow {
    appointment_id: Uuid,
    facility_id: Uuid,
    patient_id: Uuid,
    status: String,
    scheduled_at: DateTime<Utc>,
    is_deleted: bool,
    updated_at: DateTime<Utc>,
    updated_by: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PatientRow {
    patient_id: Uuid,
    facility_id: Uuid,
    full_name: String,
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    service_id: Uuid,
    name: String,
    price: Decimal,
    currency: String,
}

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    Currency::from_code(code)
        .ok_or_else(|| DatabaseError::SerializationError(format!("unknown currency '{}'", code)))
}

fn map_invoice(row: InvoiceRow, items: Vec<InvoiceItemRow>) -> Result<Invoice, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    let status = InvoiceStatus::parse(&row.status).ok_or_else(|| {
        DatabaseError::SerializationError(format!("unknown invoice status '{}'", row.status))
    })?;

    let items = items
        .into_iter()
        .map(|item| map_item(item, currency))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Invoice {
        id: InvoiceId::from_uuid(row.invoice_id),
        invoice_number: row.invoice_number,
        facility_id: FacilityId::from_uuid(row.facility_id),
        patient_id: PatientId::from_uuid(row.patient_id),
        appointment_id: row.appointment_id.map(AppointmentId::from_uuid),
        invoice_date: row.invoice_date,
        due_date: row.due_date,
        items,
        subtotal: Money::new(row.subtotal, currency),
        discount_percentage: row.discount_percentage,
        discount_amount: Money::new(row.discount_amount, currency),
        total_amount: Money::new(row.total_amount, currency),
        paid_amount: Money::new(row.paid_amount, currency),
        currency,
        status,
        notes: row.notes,
        is_deleted: row.is_deleted,
        created_at: row.created_at,
        created_by: row.created_by,
        updated_at: row.updated_at,
        updated_by: row.updated_by,
    })
}

fn map_item(row: InvoiceItemRow, currency: Currency) -> Result<InvoiceItem, DatabaseError> {
    let quantity = u32::try_from(row.quantity).map_err(|_| {
        DatabaseError::SerializationError(format!("invalid quantity {}", row.quantity))
    })?;

    Ok(InvoiceItem {
        id: row.item_id,
        invoice_id: InvoiceId::from_uuid(row.invoice_id),
        service_id: row.service_id.map(ServiceId::from_uuid),
        description: row.description,
        quantity,
        unit_price: Money::new(row.unit_price, currency),
        discount_amount: Money::new(row.discount_amount, currency),
        total_price: Money::new(row.total_price, currency),
    })
}

fn map_payment(row: PaymentRow) -> Result<Payment, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    let method = PaymentMethod::parse(&row.method).ok_or_else(|| {
        DatabaseError::SerializationError(format!("unknown payment method '{}'", row.method))
    })?;
    let status = PaymentStatus::parse(&row.status).ok_or_else(|| {
        DatabaseError::SerializationError(format!("unknown payment status '{}'", row.status))
    })?;

    Ok(Payment {
        id: PaymentId::from_uuid(row.payment_id),
        payment_reference: row.payment_reference,
        invoice_id: InvoiceId::from_uuid(row.invoice_id),
        amount: Money::new(row.amount, currency),
        method,
        status,
        payment_date: row.payment_date,
        transaction_id: row.transaction_id,
        notes: row.notes,
        processed_by: ActorId::from_uuid(row.processed_by),
        is_deleted: row.is_deleted,
        created_at: row.created_at,
        created_by: row.created_by,
    })
}

fn map_wallet(row: WalletRow) -> Result<Wallet, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    Ok(Wallet {
        id: WalletId::from_uuid(row.wallet_id),
        patient_id: PatientId::from_uuid(row.patient_id),
        balance: Money::new(row.balance, currency),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn map_appointment(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let status = AppointmentStatus::parse(&row.status).ok_or_else(|| {
        DatabaseError::SerializationError(format!("unknown appointment status '{}'", row.status))
    })?;

    Ok(Appointment {
        id: AppointmentId::from_uuid(row.appointment_id),
        facility_id: FacilityId::from_uuid(row.facility_id),
        patient_id: PatientId::from_uuid(row.patient_id),
        status,
        scheduled_at: row.scheduled_at,
        is_deleted: row.is_deleted,
        updated_at: row.updated_at,
        updated_by: row.updated_by,
    })
}

fn map_service(row: ServiceRow) -> Result<ServiceRef, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    Ok(ServiceRef {
        id: ServiceId::from_uuid(row.service_id),
        name: row.name,
        price: Money::new(row.price, currency),
    })
}

/// Maps a SQLx error into the domain error surface
///
/// Unique-constraint violations become the engine's retry signal; anything
/// else is logged with the failing operation and reduced to a generic
/// failure.
fn store_error(err: sqlx::Error, operation: &'static str) -> BillingError {
    let db_err = DatabaseError::from(&err);
    if let DatabaseError::DuplicateEntry(detail) = &db_err {
        return BillingError::DuplicateReference(detail.clone());
    }
    error!(error = %db_err, operation, "Database operation failed");
    BillingError::operation_failed("A storage error occurred")
}

fn data_error(err: DatabaseError) -> BillingError {
    error!(error = %err, "Stored data could not be mapped");
    BillingError::operation_failed("A storage error occurred")
}
