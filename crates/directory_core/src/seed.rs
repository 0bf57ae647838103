//! Fixture seeding for the directory store.
//!
//! # Responsibility
//! - Validate seed input before any row is written.
//! - Replace directory contents atomically with one seed data set.
//! - Provide the demo data set used by local runs and tests.
//! - Accept custom data sets deserialized from JSON seed files.
//!
//! # Invariants
//! - Activity parents must be declared before their children, which rules out
//!   cycles and dangling parent references.
//! - An organization links to at most `MAX_ACTIVITIES_PER_ORGANIZATION`
//!   activities.
//! - A failed seed leaves previous contents untouched.

use crate::db::DbError;
use crate::model::activity::ActivityId;
use crate::model::building::BuildingId;
use crate::model::organization::{OrganizationId, MAX_ACTIVITIES_PER_ORGANIZATION};
use log::{error, info};
use rusqlite::{params, Connection, TransactionBehavior};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Activity row to seed, linked to its parent by caller-chosen key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedActivity {
    pub key: String,
    pub name: String,
    pub parent_key: Option<String>,
}

/// Building row to seed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedBuilding {
    pub key: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Organization row to seed with its owned phones and activity links.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOrganization {
    pub name: String,
    pub building_key: String,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub activity_keys: Vec<String>,
}

/// Complete data set written by [`seed_directory`].
///
/// Deserializes from a JSON object with `activities`, `buildings` and
/// `organizations` arrays; missing arrays are empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedData {
    pub activities: Vec<SeedActivity>,
    pub buildings: Vec<SeedBuilding>,
    pub organizations: Vec<SeedOrganization>,
}

/// Row counts written by one seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub activities: usize,
    pub buildings: usize,
    pub organizations: usize,
    pub phones: usize,
}

/// Seed input rejected before writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedValidationError {
    BlankActivityName { key: String },
    DuplicateActivityKey(String),
    DuplicateActivityName(String),
    /// Parent key is unknown or declared after the child.
    UnknownParentActivity { key: String, parent_key: String },
    DuplicateBuildingKey(String),
    CoordinatesOutOfRange { key: String },
    BlankOrganizationName,
    UnknownBuilding { organization: String, building_key: String },
    UnknownActivity { organization: String, activity_key: String },
    TooManyActivities { organization: String, count: usize },
}

impl Display for SeedValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankActivityName { key } => write!(f, "activity `{key}` has a blank name"),
            Self::DuplicateActivityKey(key) => write!(f, "duplicate activity key `{key}`"),
            Self::DuplicateActivityName(name) => write!(f, "duplicate activity name `{name}`"),
            Self::UnknownParentActivity { key, parent_key } => write!(
                f,
                "activity `{key}` references parent `{parent_key}` that is not declared before it"
            ),
            Self::DuplicateBuildingKey(key) => write!(f, "duplicate building key `{key}`"),
            Self::CoordinatesOutOfRange { key } => {
                write!(f, "building `{key}` has coordinates out of range")
            }
            Self::BlankOrganizationName => write!(f, "organization name must not be blank"),
            Self::UnknownBuilding {
                organization,
                building_key,
            } => write!(
                f,
                "organization `{organization}` references unknown building `{building_key}`"
            ),
            Self::UnknownActivity {
                organization,
                activity_key,
            } => write!(
                f,
                "organization `{organization}` references unknown activity `{activity_key}`"
            ),
            Self::TooManyActivities {
                organization,
                count,
            } => write!(
                f,
                "organization `{organization}` has {count} activities; at most {MAX_ACTIVITIES_PER_ORGANIZATION} allowed"
            ),
        }
    }
}

impl Error for SeedValidationError {}

pub type SeedResult<T> = Result<T, SeedError>;

/// Errors from seeding.
#[derive(Debug)]
pub enum SeedError {
    Validation(SeedValidationError),
    Db(DbError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<SeedValidationError> for SeedError {
    fn from(value: SeedValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for SeedError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl SeedData {
    /// Checks cross-references and input limits.
    pub fn validate(&self) -> Result<(), SeedValidationError> {
        let mut activity_keys = HashSet::new();
        let mut activity_names = HashSet::new();
        for activity in &self.activities {
            if activity.name.trim().is_empty() {
                return Err(SeedValidationError::BlankActivityName {
                    key: activity.key.clone(),
                });
            }
            if let Some(parent_key) = &activity.parent_key {
                if !activity_keys.contains(parent_key.as_str()) {
                    return Err(SeedValidationError::UnknownParentActivity {
                        key: activity.key.clone(),
                        parent_key: parent_key.clone(),
                    });
                }
            }
            if !activity_keys.insert(activity.key.as_str()) {
                return Err(SeedValidationError::DuplicateActivityKey(
                    activity.key.clone(),
                ));
            }
            if !activity_names.insert(activity.name.as_str()) {
                return Err(SeedValidationError::DuplicateActivityName(
                    activity.name.clone(),
                ));
            }
        }

        let mut building_keys = HashSet::new();
        for building in &self.buildings {
            if !(-90.0..=90.0).contains(&building.latitude)
                || !(-180.0..=180.0).contains(&building.longitude)
            {
                return Err(SeedValidationError::CoordinatesOutOfRange {
                    key: building.key.clone(),
                });
            }
            if !building_keys.insert(building.key.as_str()) {
                return Err(SeedValidationError::DuplicateBuildingKey(
                    building.key.clone(),
                ));
            }
        }

        for organization in &self.organizations {
            if organization.name.trim().is_empty() {
                return Err(SeedValidationError::BlankOrganizationName);
            }
            if !building_keys.contains(organization.building_key.as_str()) {
                return Err(SeedValidationError::UnknownBuilding {
                    organization: organization.name.clone(),
                    building_key: organization.building_key.clone(),
                });
            }
            let distinct = organization
                .activity_keys
                .iter()
                .map(String::as_str)
                .collect::<HashSet<_>>();
            if distinct.len() > MAX_ACTIVITIES_PER_ORGANIZATION {
                return Err(SeedValidationError::TooManyActivities {
                    organization: organization.name.clone(),
                    count: distinct.len(),
                });
            }
            if let Some(missing) = distinct.iter().find(|key| !activity_keys.contains(*key)) {
                return Err(SeedValidationError::UnknownActivity {
                    organization: organization.name.clone(),
                    activity_key: (*missing).to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Replaces all directory rows with `data` inside one transaction.
///
/// # Side effects
/// - Deletes existing associations, phones, organizations, activities and
///   buildings before inserting.
/// - Emits one `seed` logging event with row counts.
pub fn seed_directory(conn: &mut Connection, data: &SeedData) -> SeedResult<SeedReport> {
    let started_at = Instant::now();
    data.validate()?;

    match write_seed(conn, data) {
        Ok(report) => {
            info!(
                "event=seed module=seed status=ok activities={} buildings={} organizations={} phones={} duration_ms={}",
                report.activities,
                report.buildings,
                report.organizations,
                report.phones,
                started_at.elapsed().as_millis()
            );
            Ok(report)
        }
        Err(err) => {
            error!(
                "event=seed module=seed status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn write_seed(conn: &mut Connection, data: &SeedData) -> SeedResult<SeedReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(
        "DELETE FROM organization_activities;
         DELETE FROM organization_phone_numbers;
         DELETE FROM organizations;
         DELETE FROM activities;
         DELETE FROM buildings;",
    )?;

    let mut report = SeedReport::default();

    let mut activity_ids: HashMap<&str, ActivityId> = HashMap::new();
    for activity in &data.activities {
        let parent_id = activity
            .parent_key
            .as_deref()
            .and_then(|key| activity_ids.get(key).copied());
        tx.execute(
            "INSERT INTO activities (name, parent_id) VALUES (?1, ?2);",
            params![activity.name.as_str(), parent_id],
        )?;
        activity_ids.insert(activity.key.as_str(), tx.last_insert_rowid());
        report.activities += 1;
    }

    let mut building_ids: HashMap<&str, BuildingId> = HashMap::new();
    for building in &data.buildings {
        tx.execute(
            "INSERT INTO buildings (address, latitude, longitude) VALUES (?1, ?2, ?3);",
            params![
                building.address.as_str(),
                building.latitude,
                building.longitude
            ],
        )?;
        building_ids.insert(building.key.as_str(), tx.last_insert_rowid());
        report.buildings += 1;
    }

    for organization in &data.organizations {
        let building_id = building_ids
            .get(organization.building_key.as_str())
            .copied()
            .ok_or_else(|| SeedValidationError::UnknownBuilding {
                organization: organization.name.clone(),
                building_key: organization.building_key.clone(),
            })?;
        tx.execute(
            "INSERT INTO organizations (name, building_id) VALUES (?1, ?2);",
            params![organization.name.as_str(), building_id],
        )?;
        let organization_id: OrganizationId = tx.last_insert_rowid();
        report.organizations += 1;

        for phone_number in &organization.phone_numbers {
            tx.execute(
                "INSERT INTO organization_phone_numbers (organization_id, phone_number)
                 VALUES (?1, ?2);",
                params![organization_id, phone_number.as_str()],
            )?;
            report.phones += 1;
        }

        for activity_key in &organization.activity_keys {
            let activity_id = activity_ids
                .get(activity_key.as_str())
                .copied()
                .ok_or_else(|| SeedValidationError::UnknownActivity {
                    organization: organization.name.clone(),
                    activity_key: activity_key.clone(),
                })?;
            tx.execute(
                "INSERT OR IGNORE INTO organization_activities (organization_id, activity_id)
                 VALUES (?1, ?2);",
                params![organization_id, activity_id],
            )?;
        }
    }

    tx.commit()?;
    Ok(report)
}

/// Demo data set: two activity trees, two buildings, four organizations.
///
/// `Artisan Cheese` sits three edges below `Food`, beyond the default
/// hierarchy depth.
pub fn demo_seed_data() -> SeedData {
    let activity = |key: &str, name: &str, parent_key: Option<&str>| SeedActivity {
        key: key.to_string(),
        name: name.to_string(),
        parent_key: parent_key.map(str::to_string),
    };
    let organization =
        |name: &str, building_key: &str, phone_numbers: &[&str], activity_keys: &[&str]| {
            SeedOrganization {
                name: name.to_string(),
                building_key: building_key.to_string(),
                phone_numbers: phone_numbers.iter().map(|p| p.to_string()).collect(),
                activity_keys: activity_keys.iter().map(|k| k.to_string()).collect(),
            }
        };

    SeedData {
        activities: vec![
            activity("food", "Food", None),
            activity("meat", "Meat Products", Some("food")),
            activity("dairy", "Dairy Products", Some("food")),
            activity("cheese", "Cheese", Some("dairy")),
            activity("artisan_cheese", "Artisan Cheese", Some("cheese")),
            activity("cars", "Cars", None),
            activity("trucks", "Trucks", Some("cars")),
            activity("truck_parts", "Truck Spare Parts", Some("trucks")),
            activity("truck_accessories", "Truck Accessories", Some("trucks")),
            activity("passenger", "Passenger Cars", Some("cars")),
            activity("passenger_parts", "Passenger Spare Parts", Some("passenger")),
            activity(
                "passenger_accessories",
                "Passenger Accessories",
                Some("passenger"),
            ),
        ],
        buildings: vec![
            SeedBuilding {
                key: "moscow".to_string(),
                address: "Moscow, Pushkina st. 10".to_string(),
                latitude: 55.75,
                longitude: 37.61,
            },
            SeedBuilding {
                key: "kazan".to_string(),
                address: "Kazan, Baumana st. 15".to_string(),
                latitude: 55.79,
                longitude: 49.12,
            },
        ],
        organizations: vec![
            organization(
                "Dairy Paradise",
                "moscow",
                &["8-800-123-45-67", "8-800-123-45-68", "8-800-123-45-69"],
                &["dairy"],
            ),
            organization(
                "Art Creamery",
                "moscow",
                &["8-800-765-43-21", "8-800-765-43-22"],
                &["artisan_cheese"],
            ),
            organization(
                "ProAuto",
                "kazan",
                &["8-800-111-22-33", "8-800-111-22-34"],
                &[],
            ),
            organization(
                "ProMeat",
                "kazan",
                &["8-800-111-22-33", "8-800-111-22-34"],
                &["meat"],
            ),
        ],
    }
}
