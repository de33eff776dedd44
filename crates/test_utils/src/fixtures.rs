//! Pre-built test fixtures
//!
//! Ready-to-use, predictable values for billing tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ActorContext, ActorId, Currency, FacilityId, Money, PatientId};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Builds an NGN amount
    pub fn ngn(amount: Decimal) -> Money {
        Money::new(amount, Currency::NGN)
    }

    /// A standard consultation fee
    pub fn consultation_fee() -> Money {
        Self::ngn(dec!(5000.00))
    }

    /// A typical partial payment against the consultation fee
    pub fn partial_payment() -> Money {
        Self::ngn(dec!(2000.00))
    }

    /// A modest wallet balance
    pub fn wallet_float() -> Money {
        Self::ngn(dec!(1000.00))
    }

    /// Zero in the deployment currency
    pub fn zero() -> Money {
        Money::zero(Currency::NGN)
    }
}

/// Fixture for actor contexts
pub struct ActorFixtures;

impl ActorFixtures {
    /// A cashier in a fresh facility
    pub fn cashier() -> ActorContext {
        ActorContext::new(FacilityId::new(), ActorId::new(), "cashier")
    }

    /// A cashier in a specific facility
    pub fn cashier_at(facility_id: FacilityId) -> ActorContext {
        ActorContext::new(facility_id, ActorId::new(), "cashier")
    }

    /// A second actor from a different facility, for isolation tests
    pub fn outsider() -> ActorContext {
        ActorContext::new(FacilityId::new(), ActorId::new(), "outsider")
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn patient_id() -> PatientId {
        PatientId::new()
    }

    pub fn facility_id() -> FacilityId {
        FacilityId::new()
    }
}
