//! Request, filter, and paging types
//!
//! Transport-level field validation happens upstream; the checks here are
//! the semantic rules the engine owns regardless of how a request arrived.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{AppointmentId, InvoiceId, PatientId, ServiceId};

use crate::error::BillingError;
use crate::payment::PaymentMethod;

/// Request to create an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: PatientId,
    pub appointment_id: Option<AppointmentId>,
    pub discount_percentage: Decimal,
    pub notes: Option<String>,
    pub items: Vec<CreateInvoiceItemRequest>,
}

/// One requested invoice line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceItemRequest {
    /// Catalog service; when set, the service name overrides `description`
    pub service_id: Option<ServiceId>,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
}

impl CreateInvoiceRequest {
    /// Checks the request before any store access
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.items.is_empty() {
            return Err(BillingError::validation("At least one item is required"));
        }
        if self.discount_percentage < Decimal::ZERO || self.discount_percentage > dec!(100) {
            return Err(BillingError::validation(
                "Discount percentage must be between 0 and 100",
            ));
        }
        for item in &self.items {
            if item.description.trim().is_empty() && item.service_id.is_none() {
                return Err(BillingError::validation("Item description is required"));
            }
            if item.quantity == 0 {
                return Err(BillingError::validation("Quantity must be greater than 0"));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(BillingError::validation("Unit price cannot be negative"));
            }
            if item.discount_amount < Decimal::ZERO {
                return Err(BillingError::validation(
                    "Discount amount cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

/// Request to apply a payment to an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyPaymentRequest {
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Opaque external transaction id, passed through untouched
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

impl ApplyPaymentRequest {
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.amount <= Decimal::ZERO {
            return Err(BillingError::invalid_amount(
                "Payment amount must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Filters for invoice listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub patient_id: Option<PatientId>,
    /// Inclusive lower bound on the invoice date
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the invoice date
    pub end_date: Option<NaiveDate>,
}

impl InvoiceFilter {
    /// Filter for a single patient's invoices
    pub fn for_patient(patient_id: PatientId) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Default::default()
        }
    }
}

/// A page request, 1-based
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.clamp(1, 100),
        }
    }

    /// Number of records to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 20,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: &PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(page.page_size)) as u32;
        Self {
            items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> CreateInvoiceItemRequest {
        CreateInvoiceItemRequest {
            service_id: None,
            description: "Consultation".to_string(),
            quantity: 1,
            unit_price: dec!(5000),
            discount_amount: Decimal::ZERO,
        }
    }

    #[test]
    fn test_create_invoice_request_valid() {
        let request = CreateInvoiceRequest {
            patient_id: PatientId::new(),
            appointment_id: None,
            discount_percentage: dec!(10),
            notes: None,
            items: vec![item()],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_invoice_request_needs_items() {
        let request = CreateInvoiceRequest {
            patient_id: PatientId::new(),
            appointment_id: None,
            discount_percentage: Decimal::ZERO,
            notes: None,
            items: vec![],
        };
        assert!(matches!(
            request.validate(),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_discount_percentage_bounds() {
        let mut request = CreateInvoiceRequest {
            patient_id: PatientId::new(),
            appointment_id: None,
            discount_percentage: dec!(101),
            notes: None,
            items: vec![item()],
        };
        assert!(request.validate().is_err());

        request.discount_percentage = dec!(100);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_apply_payment_request_rejects_non_positive() {
        let request = ApplyPaymentRequest {
            invoice_id: InvoiceId::new(),
            amount: Decimal::ZERO,
            method: PaymentMethod::Cash,
            transaction_id: None,
            notes: None,
        };
        assert!(matches!(
            request.validate(),
            Err(BillingError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_page_math() {
        let page = PageRequest::new(3, 20);
        assert_eq!(page.offset(), 40);

        let result: Page<u32> = Page::new(vec![], &page, 45);
        assert_eq!(result.total_pages, 3);
    }

    #[test]
    fn test_page_request_sanitized() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 1);
    }
}
