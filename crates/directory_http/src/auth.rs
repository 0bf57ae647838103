//! Static shared-secret gate for directory endpoints.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use log::warn;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the request carried the configured API key.
///
/// Add it as the first handler argument so the key is checked before
/// path or query extraction and before any store access.
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

impl FromRequestParts<Arc<AppState>> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            Some(key) if constant_time_eq(key.as_bytes(), state.config.api_key.as_bytes()) => {
                Ok(ApiKey)
            }
            Some(_) => {
                warn!(
                    "event=auth module=http status=error reason=mismatch path={}",
                    parts.uri.path()
                );
                Err(ApiError::Unauthorized)
            }
            None => {
                warn!(
                    "event=auth module=http status=error reason=missing path={}",
                    parts.uri.path()
                );
                Err(ApiError::Unauthorized)
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
