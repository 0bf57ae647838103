//! Activity taxonomy model.
//!
//! # Responsibility
//! - Describe one node of the business activity forest.
//! - Provide the read-side shape that pairs an activity with its children.
//!
//! # Invariants
//! - `name` is unique across all activities.
//! - `parent_id = None` marks a root; parent chains never form cycles.
//! - Children are derived from `parent_id`, never stored on the parent.

/// Storage-assigned activity identifier.
pub type ActivityId = i64;

/// One business activity category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub parent_id: Option<ActivityId>,
}

/// Activity together with its direct children.
///
/// Children are one level deep; grandchildren are not expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityNode {
    pub activity: Activity,
    pub children: Vec<Activity>,
}
