// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Token-protected routes: triggering a check and updating the configuration.

use crate::app::AppState;
use crate::models::check::CheckResponse;
use crate::models::config::{normalize_keywords, parse_target_url, CheckRequest, PersistedConfig};
use crate::models::status::{ErrorResponse, UpdateConfigResponse};
use crate::services::check_token::{extract_token, verify, TokenError};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(check_handler, update_config_handler),
    components(schemas(
        CheckRequest,
        CheckResponse,
        PersistedConfig,
        UpdateConfigResponse,
        ErrorResponse
    ))
)]
pub struct CheckApiDoc;

/// `?token=` fallback for callers that cannot set headers (ping services)
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    /// Check token, when the `X-Check-Token` header is not used
    pub token: Option<String>,
}

/// Router with the check trigger.
pub fn check_router() -> Router<AppState> {
    Router::new().route("/check", post(check_handler))
}

fn authorize(state: &AppState, headers: &HeaderMap, query: &TokenQuery) -> Result<(), TokenError> {
    let presented = extract_token(headers, query.token.as_deref());
    verify(state.check_token_hash.as_deref(), presented.as_deref())
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// POST /check - Run a check now.
///
/// The body is optional; when present it may override the URL and keywords
/// for this run only.
#[utoipa::path(
    post,
    path = "/check",
    params(TokenQuery),
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Check finished (inspect `status`)", body = CheckResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "CHECK_TOKEN not configured", body = ErrorResponse)
    )
)]
pub async fn check_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> Response {
    if let Err(e) = authorize(&state, &headers, &query) {
        return e.into_response();
    }

    let request: CheckRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CheckRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => return bad_request(format!("Invalid check request: {e}")),
        }
    };

    tracing::info!("API check triggered");
    let result = state.runner.check_now(&state.loader, &request).await;
    Json(CheckResponse::from(&result)).into_response()
}

/// POST /config - Replace the persisted URL and keywords.
///
/// An empty URL or keyword list is allowed; the environment defaults then apply.
#[utoipa::path(
    post,
    path = "/config",
    params(TokenQuery),
    request_body = PersistedConfig,
    responses(
        (status = 200, description = "Configuration saved", body = UpdateConfigResponse),
        (status = 400, description = "Malformed body or invalid URL", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "CHECK_TOKEN not configured", body = ErrorResponse)
    )
)]
pub async fn update_config_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> Response {
    if let Err(e) = authorize(&state, &headers, &query) {
        return e.into_response();
    }

    let payload: PersistedConfig = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => return bad_request(format!("Invalid configuration: {e}")),
    };

    let url = payload.url.trim().to_string();
    if !url.is_empty() {
        if let Err(e) = parse_target_url(&url) {
            return bad_request(e.to_string());
        }
    }

    let config = PersistedConfig {
        url,
        keywords: normalize_keywords(&payload.keywords),
    };

    if let Err(e) = state.loader.store().save(&config).await {
        tracing::error!("Error updating configuration: {:#}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Error updating configuration")),
        )
            .into_response();
    }

    tracing::info!(url = %config.url, keywords = config.keywords.len(), "Configuration updated");
    Json(UpdateConfigResponse {
        success: true,
        message: "Configuration updated successfully!".to_string(),
        url: config.url,
        keywords: config.keywords,
    })
    .into_response()
}
