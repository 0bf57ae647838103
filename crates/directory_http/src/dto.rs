//! JSON response views.
//!
//! Views are built from core records and never read storage themselves.

use directory_core::{
    Activity, ActivityId, ActivityNode, Building, BuildingId, OrganizationId, OrganizationRecord,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BuildingView {
    #[schema(value_type = i64)]
    pub id: BuildingId,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Building> for BuildingView {
    fn from(value: &Building) -> Self {
        Self {
            id: value.id,
            address: value.address.clone(),
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

/// Activity with its direct children; nested children are shallow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActivityView {
    #[schema(value_type = i64)]
    pub id: ActivityId,
    pub name: String,
    #[schema(value_type = Option<i64>)]
    pub parent_id: Option<ActivityId>,
    #[schema(no_recursion)]
    pub children: Vec<ActivityView>,
}

impl ActivityView {
    fn shallow(activity: &Activity) -> Self {
        Self {
            id: activity.id,
            name: activity.name.clone(),
            parent_id: activity.parent_id,
            children: Vec::new(),
        }
    }
}

impl From<&ActivityNode> for ActivityView {
    fn from(value: &ActivityNode) -> Self {
        Self {
            children: value.children.iter().map(Self::shallow).collect(),
            ..Self::shallow(&value.activity)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrganizationView {
    #[schema(value_type = i64)]
    pub id: OrganizationId,
    pub name: String,
    #[schema(value_type = i64)]
    pub building_id: BuildingId,
    pub building: BuildingView,
    pub phone_numbers: Vec<String>,
    #[schema(value_type = Vec<i64>)]
    pub activity_ids: Vec<ActivityId>,
    pub activities: Vec<ActivityView>,
}

impl From<&OrganizationRecord> for OrganizationView {
    fn from(value: &OrganizationRecord) -> Self {
        Self {
            id: value.id(),
            name: value.name().to_string(),
            building_id: value.organization.building_id,
            building: BuildingView::from(&value.building),
            phone_numbers: value.phone_numbers.clone(),
            activity_ids: value.activity_ids(),
            activities: value.activities.iter().map(ActivityView::from).collect(),
        }
    }
}

pub fn organization_views(records: &[OrganizationRecord]) -> Vec<OrganizationView> {
    records.iter().map(OrganizationView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use directory_core::Organization;

    fn activity(id: ActivityId, name: &str, parent_id: Option<ActivityId>) -> Activity {
        Activity {
            id,
            name: name.to_string(),
            parent_id,
        }
    }

    #[test]
    fn organization_view_serializes_expected_shape() {
        let record = OrganizationRecord {
            organization: Organization {
                id: 1,
                name: "Dairy Paradise".to_string(),
                building_id: 10,
            },
            building: Building {
                id: 10,
                address: "Moscow, Pushkina st. 10".to_string(),
                latitude: 55.75,
                longitude: 37.61,
            },
            phone_numbers: vec!["8-800-123-45-67".to_string()],
            activities: vec![ActivityNode {
                activity: activity(3, "Dairy Products", Some(1)),
                children: vec![activity(4, "Cheese", Some(3))],
            }],
        };

        let json = serde_json::to_value(OrganizationView::from(&record)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "name": "Dairy Paradise",
                "building_id": 10,
                "building": {
                    "id": 10,
                    "address": "Moscow, Pushkina st. 10",
                    "latitude": 55.75,
                    "longitude": 37.61
                },
                "phone_numbers": ["8-800-123-45-67"],
                "activity_ids": [3],
                "activities": [{
                    "id": 3,
                    "name": "Dairy Products",
                    "parent_id": 1,
                    "children": [{
                        "id": 4,
                        "name": "Cheese",
                        "parent_id": 3,
                        "children": []
                    }]
                }]
            })
        );
    }
}
