// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Shared-secret protection for the trigger and configuration endpoints.
//!
//! Callers present the token in the `X-Check-Token` header or a `token` query
//! parameter. Tokens are compared as SHA-256 digests.

use crate::models::status::ErrorResponse;
use axum::http::{header::HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha2::{Digest, Sha256};

pub const CHECK_TOKEN_HEADER: &str = "X-Check-Token";

/// Token check failures
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    /// The server has no `CHECK_TOKEN` configured
    NotConfigured,
    Unauthorized,
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TokenError::NotConfigured => {
                tracing::error!("CHECK_TOKEN environment variable is required for API access");
                (StatusCode::INTERNAL_SERVER_ERROR, "CHECK_TOKEN not configured")
            }
            TokenError::Unauthorized => {
                tracing::warn!("Unauthorized check attempt");
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized - invalid or missing token",
                )
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Hash a token for comparison.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Get the presented token from the header, falling back to the query parameter.
pub fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    headers
        .get(CHECK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(query_token)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Verify a presented token against the configured digest.
pub fn verify(expected_hash: Option<&str>, presented: Option<&str>) -> Result<(), TokenError> {
    let expected_hash = expected_hash.ok_or(TokenError::NotConfigured)?;
    let presented = presented.ok_or(TokenError::Unauthorized)?;

    if hash_token(presented) == expected_hash {
        Ok(())
    } else {
        Err(TokenError::Unauthorized)
    }
}
