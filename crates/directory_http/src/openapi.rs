//! OpenAPI document for the directory endpoints.
//!
//! # Invariants
//! - Every routed handler is listed in `ApiDoc`.
//! - The document itself is served without an API key.

use crate::auth::API_KEY_HEADER;
use crate::dto::{ActivityView, BuildingView, OrganizationView};
use crate::error::ErrorBody;
use crate::handlers;
use axum::Json;
use utoipa::openapi::security::{ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const API_KEY_SCHEME: &str = "api_key";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Directory API",
        description = "Read-only directory of organizations, their buildings and business activities."
    ),
    paths(
        handlers::health,
        handlers::list_buildings,
        handlers::organizations_in_building,
        handlers::organizations_under_activity,
        handlers::organizations_by_geo,
        handlers::organizations_by_activity_name,
        handlers::search_organizations,
        handlers::organization_by_id,
    ),
    components(schemas(BuildingView, ActivityView, OrganizationView, ErrorBody)),
    modifiers(&ApiKeySecurity),
    tags(
        (name = "service", description = "Liveness"),
        (name = "buildings", description = "Buildings and their tenants"),
        (name = "activities", description = "Activity tree lookups"),
        (name = "organizations", description = "Organization search")
    )
)]
pub struct ApiDoc;

struct ApiKeySecurity;

impl Modify for ApiKeySecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            API_KEY_SCHEME,
            SecurityScheme::ApiKey(utoipa::openapi::security::ApiKey::Header(
                ApiKeyValue::new(API_KEY_HEADER),
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_directory_route() {
        let doc = ApiDoc::openapi();
        let mut paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        paths.sort_unstable();
        assert_eq!(
            paths,
            vec![
                "/activities/{activity_id}/orgs",
                "/buildings",
                "/buildings/{building_id}/orgs",
                "/health",
                "/orgs/by_activity",
                "/orgs/geo/radius",
                "/orgs/search",
                "/orgs/{org_id}",
            ]
        );
    }

    #[test]
    fn components_register_response_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.expect("components").schemas;
        for name in ["ActivityView", "BuildingView", "OrganizationView", "ErrorBody"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }
}
