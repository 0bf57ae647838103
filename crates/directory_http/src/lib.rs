//! HTTP surface for the organization directory.
//!
//! # Responsibility
//! - Route directory queries to `directory_core` services.
//! - Gate directory endpoints behind the shared API key.
//! - Shape core records into JSON views and map errors to statuses.
//! - Publish the OpenAPI document at `/openapi.json`.
//!
//! # Invariants
//! - `AppState` is read-only after startup.
//! - No connection outlives the request that opened it.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod openapi;

pub use auth::{ApiKey, API_KEY_HEADER};
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use openapi::ApiDoc;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared per-process state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi::openapi_json))
        .route("/buildings", get(handlers::list_buildings))
        .route(
            "/buildings/{building_id}/orgs",
            get(handlers::organizations_in_building),
        )
        .route(
            "/activities/{activity_id}/orgs",
            get(handlers::organizations_under_activity),
        )
        .route("/orgs/geo/radius", get(handlers::organizations_by_geo))
        .route(
            "/orgs/by_activity",
            get(handlers::organizations_by_activity_name),
        )
        .route("/orgs/search", get(handlers::search_organizations))
        .route("/orgs/{org_id}", get(handlers::organization_by_id))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=http status=ok bind_addr={} db_path={}",
        config.bind_addr,
        config.db_path.display()
    );

    axum::serve(listener, router(Arc::new(AppState::new(config))))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=http status=ok");
    Ok(())
}

async fn log_request(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    info!(
        "event=http_request module=http status={} request_id={} method={} path={} duration_ms={}",
        response.status().as_u16(),
        request_id,
        method,
        path,
        started_at.elapsed().as_millis()
    );
    response
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            "event=server_signal module=http status=error error={}",
            err
        );
    }
}
