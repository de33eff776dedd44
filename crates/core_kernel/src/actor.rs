//! Actor context
//!
//! Identity and tenancy resolution happen upstream; every engine operation
//! receives the resolved facility and actor as an explicit value rather than
//! reading ambient session state.

use serde::{Deserialize, Serialize};

use crate::identifiers::{ActorId, FacilityId};

/// The caller identity attached to a single operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    /// Tenant the caller is operating in
    pub facility_id: FacilityId,
    /// The user performing the operation
    pub actor_id: ActorId,
    /// Display name recorded on audit fields
    pub actor_name: String,
}

impl ActorContext {
    /// Creates a new actor context
    pub fn new(facility_id: FacilityId, actor_id: ActorId, actor_name: impl Into<String>) -> Self {
        Self {
            facility_id,
            actor_id,
            actor_name: actor_name.into(),
        }
    }
}
