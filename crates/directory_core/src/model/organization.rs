//! Organization domain model.
//!
//! # Responsibility
//! - Define the stored organization row and its hydrated read projection.
//!
//! # Invariants
//! - `building_id` always references an existing building.
//! - Phones are owned by exactly one organization.
//! - Activity links live in the store association, not on this struct.

use crate::model::activity::{ActivityId, ActivityNode};
use crate::model::building::{Building, BuildingId};

/// Storage-assigned organization identifier.
pub type OrganizationId = i64;

/// Upper bound of activity links accepted on the input path.
///
/// Read queries do not enforce it on already stored rows.
pub const MAX_ACTIVITIES_PER_ORGANIZATION: usize = 3;

/// Stored organization row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub building_id: BuildingId,
}

/// Organization enriched with everything a directory response needs.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationRecord {
    pub organization: Organization,
    pub building: Building,
    /// Ordered by phone row id.
    pub phone_numbers: Vec<String>,
    /// Ordered by activity id.
    pub activities: Vec<ActivityNode>,
}

impl OrganizationRecord {
    pub fn id(&self) -> OrganizationId {
        self.organization.id
    }

    pub fn name(&self) -> &str {
        self.organization.name.as_str()
    }

    /// Returns linked activity ids in ascending order.
    pub fn activity_ids(&self) -> Vec<ActivityId> {
        self.activities.iter().map(|node| node.activity.id).collect()
    }
}
