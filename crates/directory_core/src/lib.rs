//! Core domain logic for the organization directory.
//! This crate owns the query semantics: activity closure, geo filtering and
//! organization hydration.

pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use geo::{
    haversine_km, BoundingBox, GeoParams, GeoPoint, GeoQuery, GeoQueryError, RadiusFilter,
    EARTH_RADIUS_KM,
};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
    LoggingError,
};
pub use model::activity::{Activity, ActivityId, ActivityNode};
pub use model::building::{Building, BuildingId};
pub use model::organization::{
    Organization, OrganizationId, OrganizationRecord, MAX_ACTIVITIES_PER_ORGANIZATION,
};
pub use repo::directory_repo::{DirectoryStore, RepoError, RepoResult, SqliteDirectoryStore};
pub use seed::{
    demo_seed_data, seed_directory, SeedActivity, SeedBuilding, SeedData, SeedError,
    SeedOrganization, SeedReport, SeedValidationError,
};
pub use service::directory_service::{DirectoryService, ServiceError, ServiceResult};
pub use service::hierarchy::{ActivityHierarchy, DEFAULT_MAX_DEPTH};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
