// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::config::ConfigError;
use crate::services::fetcher::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Errors that end a check run early.
///
/// Notification failures are deliberately absent: a failed email does not
/// make the check itself fail.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to fetch webpage {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
}

impl CheckError {
    /// Short machine-readable kind for API responses
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Config(_) => "config_error",
            CheckError::Fetch { .. } => "fetch_error",
        }
    }
}

/// What happened during a run, from the caller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    ConfigInvalid,
    FetchFailed,
    NoMatch,
    Notified,
    NotifyFailed,
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckOutcome::ConfigInvalid => write!(f, "config_invalid"),
            CheckOutcome::FetchFailed => write!(f, "fetch_failed"),
            CheckOutcome::NoMatch => write!(f, "no_match"),
            CheckOutcome::Notified => write!(f, "notified"),
            CheckOutcome::NotifyFailed => write!(f, "notify_failed"),
        }
    }
}

/// Result of one check run. Produced once per run and never persisted.
#[derive(Debug)]
pub struct CheckResult {
    /// False only when the run could not complete (config or fetch failure)
    pub success: bool,
    /// The URL that was checked, when configuration resolved far enough
    pub url: Option<String>,
    /// Matched keywords, each at most once, in configured order
    pub matched_keywords: Vec<String>,
    pub searched_keywords: Vec<String>,
    pub error: Option<CheckError>,
    /// Set when keywords matched but the email could not be sent
    pub notify_error: Option<String>,
    pub notified: bool,
    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    pub fn failed(url: Option<String>, searched_keywords: Vec<String>, error: CheckError) -> Self {
        Self {
            success: false,
            url,
            matched_keywords: Vec::new(),
            searched_keywords,
            error: Some(error),
            notify_error: None,
            notified: false,
            timestamp: Utc::now(),
        }
    }

    pub fn outcome(&self) -> CheckOutcome {
        match &self.error {
            Some(CheckError::Config(_)) => CheckOutcome::ConfigInvalid,
            Some(CheckError::Fetch { .. }) => CheckOutcome::FetchFailed,
            None if self.matched_keywords.is_empty() => CheckOutcome::NoMatch,
            None if self.notify_error.is_some() => CheckOutcome::NotifyFailed,
            None => CheckOutcome::Notified,
        }
    }

    /// One-line, human readable summary of the run
    pub fn summary(&self) -> String {
        let matched = self.matched_keywords.join(", ");
        match (&self.error, self.outcome()) {
            (Some(err), _) => err.to_string(),
            (None, CheckOutcome::NoMatch) => "No keywords found on the webpage".to_string(),
            (None, CheckOutcome::NotifyFailed) => {
                format!("Keywords found but email failed: {}", matched)
            }
            (None, _) => format!("Keywords found and email sent: {}", matched),
        }
    }
}

/// Response body of `POST /check` and of `check --json`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckResponse {
    /// One of `success`, `warning`, `info`, `error`
    pub status: String,
    pub message: String,
    pub found_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_error: Option<String>,
    /// RFC 3339 timestamp of the run
    pub checked_at: String,
}

impl From<&CheckResult> for CheckResponse {
    fn from(result: &CheckResult) -> Self {
        let status = match result.outcome() {
            CheckOutcome::ConfigInvalid | CheckOutcome::FetchFailed => "error",
            CheckOutcome::NoMatch => "info",
            CheckOutcome::NotifyFailed => "warning",
            CheckOutcome::Notified => "success",
        };

        Self {
            status: status.to_string(),
            message: result.summary(),
            found_keywords: result.matched_keywords.clone(),
            url: result.url.clone(),
            notified: result.notified,
            error_kind: result.error.as_ref().map(|e| e.kind().to_string()),
            notify_error: result.notify_error.clone(),
            checked_at: result.timestamp.to_rfc3339(),
        }
    }
}

/// Email composed for one alert. Built per notification and dropped after send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
    pub recipient: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(matched: &[&str], notify_error: Option<&str>) -> CheckResult {
        CheckResult {
            success: true,
            url: Some("https://example.com/".to_string()),
            matched_keywords: matched.iter().map(|k| k.to_string()).collect(),
            searched_keywords: vec!["sale".to_string(), "concert".to_string()],
            error: None,
            notify_error: notify_error.map(str::to_string),
            notified: !matched.is_empty() && notify_error.is_none(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_outcome_no_match() {
        let result = completed(&[], None);
        assert_eq!(result.outcome(), CheckOutcome::NoMatch);
        assert_eq!(result.summary(), "No keywords found on the webpage");
    }

    #[test]
    fn test_outcome_notified() {
        let result = completed(&["sale", "concert"], None);
        assert_eq!(result.outcome(), CheckOutcome::Notified);
        assert_eq!(
            result.summary(),
            "Keywords found and email sent: sale, concert"
        );
    }

    #[test]
    fn test_outcome_notify_failed_still_success() {
        let result = completed(&["sale"], Some("authentication failed"));
        assert!(result.success);
        assert_eq!(result.outcome(), CheckOutcome::NotifyFailed);
        assert_eq!(result.summary(), "Keywords found but email failed: sale");
    }

    #[test]
    fn test_outcome_config_invalid() {
        let result = CheckResult::failed(
            None,
            Vec::new(),
            CheckError::Config(ConfigError::Missing("keywords")),
        );
        assert!(!result.success);
        assert_eq!(result.outcome(), CheckOutcome::ConfigInvalid);
        assert_eq!(
            result.summary(),
            "Configuration error: missing required setting: keywords"
        );
    }

    #[test]
    fn test_outcome_fetch_failed() {
        let result = CheckResult::failed(
            Some("https://example.com/".to_string()),
            vec!["sale".to_string()],
            CheckError::Fetch {
                url: "https://example.com/".to_string(),
                source: FetchError::Status { status: 404 },
            },
        );
        assert_eq!(result.outcome(), CheckOutcome::FetchFailed);
        assert!(result
            .summary()
            .starts_with("Failed to fetch webpage https://example.com/"));
    }

    #[test]
    fn test_response_status_mapping() {
        let warning = CheckResponse::from(&completed(&["sale"], Some("smtp down")));
        assert_eq!(warning.status, "warning");
        assert_eq!(warning.found_keywords, vec!["sale"]);
        assert_eq!(warning.notify_error.as_deref(), Some("smtp down"));
        assert!(!warning.notified);

        let info = CheckResponse::from(&completed(&[], None));
        assert_eq!(info.status, "info");
        assert!(info.found_keywords.is_empty());

        let error = CheckResponse::from(&CheckResult::failed(
            None,
            Vec::new(),
            CheckError::Config(ConfigError::Missing("url")),
        ));
        assert_eq!(error.status, "error");
        assert_eq!(error.error_kind.as_deref(), Some("config_error"));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(CheckOutcome::FetchFailed.to_string(), "fetch_failed");
        assert_eq!(CheckOutcome::NotifyFailed.to_string(), "notify_failed");
    }
}
