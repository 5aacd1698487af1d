// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application settings, state, read-only route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::config::{normalize_keywords, EnvOverrides, PersistedConfig};
use crate::models::status::{ErrorResponse, StatusConfig, StatusResponse};
use crate::models::version::VersionResponse;
use crate::routes::{check_router, update_config_handler, CheckApiDoc};
use crate::services::check::CheckRunner;
use crate::services::check_token::hash_token;
use crate::services::config_store::ConfigLoader;
use crate::services::fetcher::{DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};
use crate::services::logging::display_email;
use crate::services::notifier::SmtpSettings;
use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `KEYWORD_AGENT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("KEYWORD_AGENT_VERSION");

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Everything read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub overrides: EnvOverrides,
    pub smtp: SmtpSettings,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    /// SHA-256 of `CHECK_TOKEN`; protected routes refuse to run without it
    pub check_token_hash: Option<String>,
}

impl AppSettings {
    pub fn from_env() -> Result<Self> {
        let fetch_timeout = match env::var("FETCH_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .context("FETCH_TIMEOUT_SECS must be a valid number")?,
            ),
            Err(_) => DEFAULT_FETCH_TIMEOUT,
        };

        Ok(Self {
            overrides: EnvOverrides::from_env(),
            smtp: SmtpSettings::from_env()?,
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            fetch_timeout,
            check_token_hash: env::var("CHECK_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .map(|t| hash_token(t.trim())),
        })
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<ConfigLoader>,
    pub runner: CheckRunner,
    pub check_token_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "keyword-agent".to_string(),
        version: VERSION.to_string(),
    })
}

pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let persisted = load_persisted(&state).await?;
    let env = state.loader.env();

    let url = if persisted.url.trim().is_empty() {
        env.default_url.clone()
    } else {
        persisted.url.trim().to_string()
    };
    let mut keywords = normalize_keywords(&persisted.keywords);
    if keywords.is_empty() {
        keywords = env.default_keywords.clone();
    }

    Ok(Json(StatusResponse {
        url_configured: !url.is_empty(),
        keywords_configured: !keywords.is_empty(),
        email_configured: env.email_configured(),
        config: StatusConfig {
            url,
            keywords,
            sender_email: display_email(&env.sender_email),
            receiver_email: display_email(&env.receiver_email),
        },
    }))
}

pub async fn get_config_handler(
    State(state): State<AppState>,
) -> Result<Json<PersistedConfig>, (StatusCode, Json<ErrorResponse>)> {
    load_persisted(&state).await.map(Json)
}

async fn load_persisted(
    state: &AppState,
) -> Result<PersistedConfig, (StatusCode, Json<ErrorResponse>)> {
    state.loader.store().load().await.map_err(|e| {
        tracing::error!("Failed to load configuration: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to load configuration: {e}"))),
        )
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/status", get(status_handler))
        .route(
            "/config",
            get(get_config_handler).post(update_config_handler),
        )
        .merge(check_router())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", CheckApiDoc::openapi()))
}
