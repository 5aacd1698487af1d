// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Monitor configuration: the persisted record, environment overrides, and the
//! resolved per-run snapshot handed to the check pipeline.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;

/// Configuration errors. Fatal to a check run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("config store unavailable: {0}")]
    Store(String),
}

/// The record persisted to the config file. Never holds secrets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PersistedConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Values read from the environment once at startup.
///
/// `default_url` and `default_keywords` only apply when the persisted record
/// leaves the field empty. Mail settings are only ever read from here.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub default_url: String,
    pub default_keywords: Vec<String>,
    pub sender_email: String,
    pub sender_password: String,
    pub receiver_email: String,
}

impl EnvOverrides {
    /// Load overrides from environment variables. Unset variables become empty.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default().trim().to_string();
        Self {
            default_url: var("DEFAULT_URL"),
            default_keywords: parse_keywords(&var("DEFAULT_KEYWORDS")),
            sender_email: var("SENDER_EMAIL"),
            sender_password: env::var("SENDER_EMAIL_PASSWORD").unwrap_or_default(),
            receiver_email: var("RECEIVER_EMAIL"),
        }
    }

    pub fn email_configured(&self) -> bool {
        !self.sender_email.is_empty()
            && !self.sender_password.is_empty()
            && !self.receiver_email.is_empty()
    }
}

/// Per-run overrides supplied by whoever triggers the check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckRequest {
    /// Check this URL instead of the configured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Search for these keywords instead of the configured ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

/// Resolved, validated settings for one check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub target_url: Url,
    pub keywords: Vec<String>,
    pub sender_email: String,
    pub sender_password: String,
    pub receiver_email: String,
}

impl MonitorConfig {
    /// Fails naming the first mail setting that is missing.
    pub fn ensure_mail_configured(&self) -> Result<(), ConfigError> {
        if self.sender_email.is_empty() {
            return Err(ConfigError::Missing("sender_email"));
        }
        if self.sender_password.is_empty() {
            return Err(ConfigError::Missing("sender_password"));
        }
        if self.receiver_email.is_empty() {
            return Err(ConfigError::Missing("receiver_email"));
        }
        Ok(())
    }
}

/// Merge the persisted record, environment overrides and request overrides.
///
/// Request overrides win when non-empty. Otherwise the persisted value is used,
/// and the environment value only fills an empty persisted field.
pub fn load_config(
    persisted: &PersistedConfig,
    env: &EnvOverrides,
    request: &CheckRequest,
) -> Result<MonitorConfig, ConfigError> {
    let request_url = request.url.as_deref().map(str::trim).unwrap_or_default();
    let raw_url = first_non_empty(&[request_url, persisted.url.trim(), env.default_url.trim()])
        .ok_or(ConfigError::Missing("url"))?;
    let target_url = parse_target_url(raw_url)?;

    let request_keywords = request
        .keywords
        .as_deref()
        .map(normalize_keywords)
        .unwrap_or_default();
    let keywords = [
        request_keywords,
        normalize_keywords(&persisted.keywords),
        normalize_keywords(&env.default_keywords),
    ]
    .into_iter()
    .find(|list| !list.is_empty())
    .ok_or(ConfigError::Missing("keywords"))?;

    Ok(MonitorConfig {
        target_url,
        keywords,
        sender_email: env.sender_email.clone(),
        sender_password: env.sender_password.clone(),
        receiver_email: env.receiver_email.clone(),
    })
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|s| !s.is_empty())
}

/// Parse and check a target URL. Only http and https are fetchable.
pub fn parse_target_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Split a comma separated keyword list.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    let parts: Vec<String> = raw.split(',').map(str::to_string).collect();
    normalize_keywords(&parts)
}

/// Trim keywords, drop empty ones and case-insensitive duplicates.
/// First occurrence wins and order is kept.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .iter()
        .map(|kw| kw.trim())
        .filter(|kw| !kw.is_empty())
        .filter(|kw| seen.insert(kw.to_lowercase()))
        .map(str::to_string)
        .collect()
}
