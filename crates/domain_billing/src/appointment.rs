//! Appointment workflow coupling
//!
//! Appointments are owned by the scheduling module; billing consumes them
//! and performs exactly two transitions as side effects of invoice events.
//! Any other status is left untouched so that billing never regresses a
//! visit a user has already progressed manually.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AppointmentId, FacilityId, PatientId};

/// Appointment workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    CheckedIn,
    AwaitingPayment,
    AwaitingVitals,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::CheckedIn => "checked_in",
            AppointmentStatus::AwaitingPayment => "awaiting_payment",
            AppointmentStatus::AwaitingVitals => "awaiting_vitals",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "checked_in" => Some(AppointmentStatus::CheckedIn),
            "awaiting_payment" => Some(AppointmentStatus::AwaitingPayment),
            "awaiting_vitals" => Some(AppointmentStatus::AwaitingVitals),
            "in_progress" => Some(AppointmentStatus::InProgress),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "no_show" => Some(AppointmentStatus::NoShow),
        _ => None,
        }
    }
}

/// A clinic appointment, as seen by billing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique identifier
    pub id: AppointmentId,
    /// Owning facility (tenant)
    pub facility_id: FacilityId,
    /// Patient attending
    pub patient_id: PatientId,
    /// Workflow status
    pub status: AppointmentStatus,
    /// Scheduled time
    pub scheduled_at: DateTime<Utc>,
    /// Soft-delete marker
    pub is_deleted: bool,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
    /// Actor of the last mutation
    pub updated_by: Option<String>,
}

impl Appointment {
    /// Creates an appointment in the given status
    pub fn new(
        facility_id: FacilityId,
        patient_id: PatientId,
        status: AppointmentStatus,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AppointmentId::new_v7(),
            facility_id,
            patient_id,
            status,
            scheduled_at,
            is_deleted: false,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    /// Coupling for invoice creation: a checked-in visit moves to the
    /// cashier queue. Returns whether the appointment changed.
    pub fn on_invoice_created(&mut self, by: &str) -> bool {
        if self.status != AppointmentStatus::CheckedIn {
            return false;
        }
        self.status = AppointmentStatus::AwaitingPayment;
        self.touch(by);
        true
    }

    /// Coupling for full invoice settlement: a visit waiting at the cashier
    /// moves on to vitals. Returns whether the appointment changed.
    pub fn on_invoice_settled(&mut self, by: &str) -> bool {
        if self.status != AppointmentStatus::AwaitingPayment {
            return false;
        }
        self.status = AppointmentStatus::AwaitingVitals;
        self.touch(by);
        true
    }

    fn touch(&mut self, by: &str) {
        self.updated_at = Utc::now();
        self.updated_by = Some(by.to_string());
    }
}
