// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for `GET /status`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub url_configured: bool,
    pub keywords_configured: bool,
    pub email_configured: bool,
    pub config: StatusConfig,
}

/// Effective configuration as shown to operators. Email addresses are anonymized.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusConfig {
    pub url: String,
    pub keywords: Vec<String>,
    pub sender_email: String,
    pub receiver_email: String,
}

/// Response after updating the persisted configuration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateConfigResponse {
    pub success: bool,
    pub message: String,
    pub url: String,
    pub keywords: Vec<String>,
}

/// Generic error body for API failures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
