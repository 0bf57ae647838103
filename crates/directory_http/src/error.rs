//! HTTP error mapping.
//!
//! # Invariants
//! - Every error body is `{"detail": <message>}`.
//! - Internal failure details are logged, never returned to clients.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use directory_core::{RepoError, ServiceError};
use log::error;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use utoipa::ToSchema;

pub const UNAUTHORIZED_DETAIL: &str = "Invalid or missing API key";
pub const NOT_FOUND_DETAIL: &str = "Organization not found";
pub const INTERNAL_DETAIL: &str = "internal error";
const WWW_AUTHENTICATE_VALUE: &str = "API key";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// Request failure rendered as a JSON response.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::Unauthorized => UNAUTHORIZED_DETAIL,
            Self::BadRequest(message) => message.as_str(),
            Self::NotFound => NOT_FOUND_DETAIL,
            Self::Internal(_) => INTERNAL_DETAIL,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal(message) => write!(f, "internal error: {message}"),
            other => write!(f, "{}", other.detail()),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound(_) => Self::NotFound,
            ServiceError::Validation(err) => Self::BadRequest(err.to_string()),
            ServiceError::Store(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(message) = &self {
            error!(
                "event=http_error module=http status=error error={}",
                message
            );
        }

        let status = self.status();
        let body = ErrorBody {
            detail: self.detail().to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use directory_core::GeoQueryError;

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(ServiceError::NotFound(7)).status(),
            StatusCode::NOT_FOUND
        );
        let validation = ApiError::from(ServiceError::Validation(GeoQueryError::MissingFilter));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.detail(), GeoQueryError::MissingFilter.to_string());
    }

    #[test]
    fn internal_detail_hides_message() {
        let err = ApiError::Internal("disk I/O error at /secret/path".to_string());
        assert_eq!(err.detail(), INTERNAL_DETAIL);
        assert!(err.to_string().contains("/secret/path"));
    }

    #[test]
    fn unauthorized_sets_www_authenticate() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "API key"
        );
    }
}
