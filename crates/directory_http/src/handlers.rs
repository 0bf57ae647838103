//! Directory endpoint handlers.
//!
//! # Invariants
//! - Every directory handler takes `ApiKey` first.
//! - Each request opens its own read-only connection on a blocking worker and
//!   drops it before the response is written.

use crate::auth::ApiKey;
use crate::dto::{organization_views, BuildingView, OrganizationView};
use crate::error::{ApiError, ErrorBody};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use directory_core::db::open_db_read_only;
use directory_core::{
    ActivityId, BuildingId, DirectoryService, GeoParams, GeoQuery, OrganizationId, RepoError,
    ServiceError, ServiceResult, SqliteDirectoryStore,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeoQueryParams {
    /// Center latitude in degrees.
    pub lat: f64,
    /// Center longitude in degrees.
    pub lon: f64,
    /// Radius in kilometres; wins over the box when present.
    pub radius_km: Option<f64>,
    pub lat_min: Option<f64>,
    pub lon_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_max: Option<f64>,
}

impl From<GeoQueryParams> for GeoParams {
    fn from(value: GeoQueryParams) -> Self {
        Self {
            lat: value.lat,
            lon: value.lon,
            radius_km: value.radius_km,
            lat_min: value.lat_min,
            lon_min: value.lon_min,
            lat_max: value.lat_max,
            lon_max: value.lon_max,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityNameQuery {
    /// Exact activity name, case-insensitive.
    pub activity: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NameSearchQuery {
    /// Substring of the organization name, case-insensitive.
    pub name: String,
}

type OrganizationsResponse = Result<Json<Vec<OrganizationView>>, ApiError>;

#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

#[utoipa::path(
    get,
    path = "/buildings",
    tag = "buildings",
    responses(
        (status = 200, description = "All buildings ordered by id", body = [BuildingView]),
        (status = 401, description = "Missing or wrong API key", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn list_buildings(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BuildingView>>, ApiError> {
    let buildings = with_service(&state, |service| service.list_buildings()).await?;
    Ok(Json(buildings.iter().map(BuildingView::from).collect()))
}

#[utoipa::path(
    get,
    path = "/buildings/{building_id}/orgs",
    tag = "buildings",
    params(("building_id" = i64, Path, description = "Building id")),
    responses(
        (status = 200, description = "Organizations housed in the building", body = [OrganizationView]),
        (status = 401, description = "Missing or wrong API key", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn organizations_in_building(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Path(building_id): Path<BuildingId>,
) -> OrganizationsResponse {
    let records = with_service(&state, move |service| {
        service.organizations_in_building(building_id)
    })
    .await?;
    Ok(Json(organization_views(&records)))
}

#[utoipa::path(
    get,
    path = "/activities/{activity_id}/orgs",
    tag = "activities",
    params(("activity_id" = i64, Path, description = "Root activity id")),
    responses(
        (status = 200, description = "Organizations under the activity subtree", body = [OrganizationView]),
        (status = 401, description = "Missing or wrong API key", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn organizations_under_activity(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<ActivityId>,
) -> OrganizationsResponse {
    let records = with_service(&state, move |service| {
        service.organizations_under_activity(activity_id)
    })
    .await?;
    Ok(Json(organization_views(&records)))
}

#[utoipa::path(
    get,
    path = "/orgs/geo/radius",
    tag = "organizations",
    params(GeoQueryParams),
    responses(
        (status = 200, description = "Organizations whose building lies inside the area", body = [OrganizationView]),
        (status = 401, description = "Missing or wrong API key", body = ErrorBody),
        (status = 400, description = "Incomplete or invalid area", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn organizations_by_geo(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Query(params): Query<GeoQueryParams>,
) -> OrganizationsResponse {
    let query = GeoQuery::from_params(&GeoParams::from(params)).map_err(ServiceError::from)?;
    let records = with_service(&state, move |service| service.organizations_by_geo(&query)).await?;
    Ok(Json(organization_views(&records)))
}

#[utoipa::path(
    get,
    path = "/orgs/by_activity",
    tag = "organizations",
    params(ActivityNameQuery),
    responses(
        (status = 200, description = "Organizations under the named activity subtree", body = [OrganizationView]),
        (status = 401, description = "Missing or wrong API key", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn organizations_by_activity_name(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityNameQuery>,
) -> OrganizationsResponse {
    let records = with_service(&state, move |service| {
        service.organizations_under_activity_name(&params.activity)
    })
    .await?;
    Ok(Json(organization_views(&records)))
}

#[utoipa::path(
    get,
    path = "/orgs/search",
    tag = "organizations",
    params(NameSearchQuery),
    responses(
        (status = 200, description = "Organizations whose name contains the fragment", body = [OrganizationView]),
        (status = 401, description = "Missing or wrong API key", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn search_organizations(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameSearchQuery>,
) -> OrganizationsResponse {
    let records = with_service(&state, move |service| {
        service.organizations_matching_name(&params.name)
    })
    .await?;
    Ok(Json(organization_views(&records)))
}

#[utoipa::path(
    get,
    path = "/orgs/{org_id}",
    tag = "organizations",
    params(("org_id" = i64, Path, description = "Organization id")),
    responses(
        (status = 200, description = "The organization", body = OrganizationView),
        (status = 401, description = "Missing or wrong API key", body = ErrorBody),
        (status = 404, description = "Organization not found", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn organization_by_id(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<OrganizationId>,
) -> Result<Json<OrganizationView>, ApiError> {
    let record = with_service(&state, move |service| service.organization_by_id(org_id)).await?;
    Ok(Json(OrganizationView::from(&record)))
}

/// Runs one service call against a fresh connection on a blocking worker.
async fn with_service<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DirectoryService<SqliteDirectoryStore<'_>>) -> ServiceResult<T> + Send + 'static,
{
    let db_path = state.config.db_path.clone();
    tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
        let conn = open_db_read_only(&db_path).map_err(RepoError::from)?;
        let store = SqliteDirectoryStore::try_new(&conn)?;
        let service = DirectoryService::new(store);
        call(&service).map_err(ApiError::from)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("blocking task failed: {err}")))?
}
