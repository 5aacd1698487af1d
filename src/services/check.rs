// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! The check pipeline: fetch, extract, match, notify.

use crate::models::check::{CheckError, CheckResult};
use crate::models::config::{CheckRequest, ConfigError, MonitorConfig};
use crate::services::config_store::ConfigLoader;
use crate::services::extractor::extract_text;
use crate::services::fetcher::PageFetcher;
use crate::services::matcher::match_keywords;
use crate::services::notifier::Notifier;
use chrono::Utc;
use std::sync::Arc;

/// Pipeline stages, in order. Used for tracing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fetching,
    Extracting,
    Matching,
    Notifying,
}

/// Runs one check at a time per call. Holds no state between runs.
#[derive(Clone)]
pub struct CheckRunner {
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
}

impl CheckRunner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, notifier: Arc<dyn Notifier>) -> Self {
        Self { fetcher, notifier }
    }

    /// Resolve the configuration and run the pipeline.
    ///
    /// Configuration problems are returned as a failed `CheckResult` and no
    /// request is made.
    pub async fn check_now(&self, loader: &ConfigLoader, request: &CheckRequest) -> CheckResult {
        let result = self.resolve_and_run(loader, request).await;
        tracing::info!(
            outcome = %result.outcome(),
            config = %loader.store().path().display(),
            "Check finished"
        );
        result
    }

    async fn resolve_and_run(&self, loader: &ConfigLoader, request: &CheckRequest) -> CheckResult {
        let config = match loader.load(request).await {
            Ok(config) => config,
            Err(e) => return config_failure(None, Vec::new(), e),
        };

        // Every run may end in a notification, so mail settings are required up front
        if let Err(e) = config.ensure_mail_configured() {
            return config_failure(
                Some(config.target_url.to_string()),
                config.keywords.clone(),
                e,
            );
        }

        self.run(&config).await
    }

    /// Run the pipeline against an already resolved configuration.
    pub async fn run(&self, config: &MonitorConfig) -> CheckResult {
        let url = config.target_url.to_string();

        if config.keywords.is_empty() {
            return config_failure(
                Some(url),
                Vec::new(),
                ConfigError::Missing("keywords"),
            );
        }

        tracing::debug!(stage = ?Stage::Fetching, url = %url);
        let body = match self.fetcher.fetch(&config.target_url).await {
            Ok(body) => body,
            Err(source) => {
                let error = CheckError::Fetch {
                    url: url.clone(),
                    source,
                };
                tracing::error!("{}", error);
                return CheckResult::failed(Some(url), config.keywords.clone(), error);
            }
        };

        tracing::debug!(stage = ?Stage::Extracting, bytes = body.len());
        let text = extract_text(&body);
        tracing::info!(url = %url, chars = text.chars().count(), "Extracted page text");

        tracing::debug!(stage = ?Stage::Matching, keywords = config.keywords.len());
        let matched = match_keywords(&text, &config.keywords);

        let mut result = CheckResult {
            success: true,
            url: Some(url),
            matched_keywords: matched,
            searched_keywords: config.keywords.clone(),
            error: None,
            notify_error: None,
            notified: false,
            timestamp: Utc::now(),
        };

        if result.matched_keywords.is_empty() {
            tracing::info!("No keywords found on the webpage");
            return result;
        }

        tracing::info!(keywords = %result.matched_keywords.join(", "), "Keywords found");
        tracing::debug!(stage = ?Stage::Notifying);
        match self.notifier.notify(&result.matched_keywords, config).await {
            Ok(()) => result.notified = true,
            Err(e) => {
                tracing::error!("Keywords found but email failed: {}", e);
                result.notify_error = Some(e.to_string());
            }
        }

        result
    }
}

fn config_failure(url: Option<String>, keywords: Vec<String>, error: ConfigError) -> CheckResult {
    tracing::warn!("Configuration error: {}", error);
    CheckResult::failed(url, keywords, CheckError::Config(error))
}
