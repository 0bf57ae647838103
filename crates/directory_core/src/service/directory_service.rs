//! Directory query use-case service.
//!
//! # Responsibility
//! - Answer every read query the directory exposes.
//! - Map absent single entities and invalid geo input to semantic errors.
//!
//! # Invariants
//! - Unknown building ids, activity ids, activity names and unmatched name
//!   patterns yield empty lists, never errors.
//! - Only `organization_by_id` reports `NotFound`.
//! - Service layer remains storage-agnostic.

use crate::geo::{BoundingBox, GeoPoint, GeoQuery, GeoQueryError, RadiusFilter};
use crate::model::activity::ActivityId;
use crate::model::building::{Building, BuildingId};
use crate::model::organization::{OrganizationId, OrganizationRecord};
use crate::repo::directory_repo::{DirectoryStore, RepoError, RepoResult};
use crate::service::hierarchy::ActivityHierarchy;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from directory service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Requested organization does not exist.
    NotFound(OrganizationId),
    /// Caller supplied an unusable geo filter.
    Validation(GeoQueryError),
    /// Store-level failure.
    Store(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "organization not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<GeoQueryError> for ServiceError {
    fn from(value: GeoQueryError) -> Self {
        Self::Validation(value)
    }
}

/// Read-only directory facade over a store implementation.
pub struct DirectoryService<S: DirectoryStore> {
    store: S,
}

impl<S: DirectoryStore> DirectoryService<S> {
    /// Creates service from store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists every building.
    pub fn list_buildings(&self) -> ServiceResult<Vec<Building>> {
        let started_at = Instant::now();
        let result = self.store.all_buildings();
        observe("list_buildings", started_at, result)
    }

    /// Lists organizations in one building; unknown ids yield an empty list.
    pub fn organizations_in_building(
        &self,
        building_id: BuildingId,
    ) -> ServiceResult<Vec<OrganizationRecord>> {
        let started_at = Instant::now();
        let result = self.store.organizations_by_building(building_id);
        observe("organizations_in_building", started_at, result)
    }

    /// Lists organizations tagged with `activity_id` or its descendants.
    pub fn organizations_under_activity(
        &self,
        activity_id: ActivityId,
    ) -> ServiceResult<Vec<OrganizationRecord>> {
        let started_at = Instant::now();
        let result = ActivityHierarchy::new(&self.store)
            .closure(activity_id)
            .and_then(|ids| self.store.organizations_by_activity_ids(&ids));
        observe("organizations_under_activity", started_at, result)
    }

    /// Same as [`Self::organizations_under_activity`], rooted by exact name.
    pub fn organizations_under_activity_name(
        &self,
        name: &str,
    ) -> ServiceResult<Vec<OrganizationRecord>> {
        let started_at = Instant::now();
        let result = ActivityHierarchy::new(&self.store)
            .closure_by_name(name)
            .and_then(|ids| {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.store.organizations_by_activity_ids(&ids)
            });
        observe("organizations_under_activity_name", started_at, result)
    }

    /// Case-insensitive substring search over organization names.
    pub fn organizations_matching_name(
        &self,
        substring: &str,
    ) -> ServiceResult<Vec<OrganizationRecord>> {
        let started_at = Instant::now();
        let result = self.store.organizations_by_name_substring(substring);
        observe("organizations_matching_name", started_at, result)
    }

    /// Organizations whose building is within `radius_km` of the point.
    pub fn organizations_near_point(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> ServiceResult<Vec<OrganizationRecord>> {
        let started_at = Instant::now();
        let filter = RadiusFilter::new(GeoPoint::new(lat, lon), radius_km);
        let result = self
            .store
            .all_organizations_with_buildings()
            .map(|records| {
                records
                    .into_iter()
                    .filter(|record| filter.contains(record.building.location()))
                    .collect()
            });
        observe("organizations_near_point", started_at, result)
    }

    /// Organizations whose building lies inside the box, bounds inclusive.
    pub fn organizations_in_bbox(
        &self,
        lat_min: f64,
        lon_min: f64,
        lat_max: f64,
        lon_max: f64,
    ) -> ServiceResult<Vec<OrganizationRecord>> {
        let started_at = Instant::now();
        let bbox = BoundingBox::new(lat_min, lon_min, lat_max, lon_max);
        let result = self.store.organizations_in_bbox(&bbox);
        observe("organizations_in_bbox", started_at, result)
    }

    /// Dispatches a validated geo query to the radius or bbox lookup.
    pub fn organizations_by_geo(&self, query: &GeoQuery) -> ServiceResult<Vec<OrganizationRecord>> {
        match query {
            GeoQuery::Radius(filter) => self.organizations_near_point(
                filter.center.latitude,
                filter.center.longitude,
                filter.radius_km,
            ),
            GeoQuery::BoundingBox(bbox) => {
                self.organizations_in_bbox(bbox.lat_min, bbox.lon_min, bbox.lat_max, bbox.lon_max)
            }
        }
    }

    /// Loads one organization.
    ///
    /// Returns `ServiceError::NotFound` when the id does not exist.
    pub fn organization_by_id(&self, id: OrganizationId) -> ServiceResult<OrganizationRecord> {
        let started_at = Instant::now();
        let result = self.store.organization_by_id(id);
        match observe("organization_by_id", started_at, result)? {
            Some(record) => Ok(record),
            None => Err(ServiceError::NotFound(id)),
        }
    }
}

trait ResultCount {
    fn result_count(&self) -> usize;
}

impl<T> ResultCount for Vec<T> {
    fn result_count(&self) -> usize {
        self.len()
    }
}

impl<T> ResultCount for Option<T> {
    fn result_count(&self) -> usize {
        usize::from(self.is_some())
    }
}

fn observe<T: ResultCount>(
    op: &'static str,
    started_at: Instant,
    result: RepoResult<T>,
) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            info!(
                "event={} module=service status=ok result_count={} duration_ms={}",
                op,
                value.result_count(),
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            error!(
                "event={} module=service status=error duration_ms={} error={}",
                op,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}
