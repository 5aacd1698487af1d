// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Tracing setup and helpers for keeping personal data out of the logs.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Human-readable output on stdout, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Anonymize an email address for logging: "a***@example.com"
pub fn anonymize_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) => format!("{}***@{}", first, domain),
            None => format!("***@{}", domain),
        },
        None => "***@***".to_string(),
    }
}

/// Anonymized address, or "Not configured" when empty
pub fn display_email(email: &str) -> String {
    if email.is_empty() {
        "Not configured".to_string()
    } else {
        anonymize_email(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymize_email() {
        assert_eq!(anonymize_email("alerts@example.com"), "a***@example.com");
        assert_eq!(anonymize_email("x@test.org"), "x***@test.org");
    }

    #[test]
    fn test_anonymize_email_empty_local() {
        assert_eq!(anonymize_email("@example.com"), "***@example.com");
    }

    #[test]
    fn test_anonymize_email_no_at() {
        assert_eq!(anonymize_email("notanemail"), "***@***");
    }

    #[test]
    fn test_display_email_not_configured() {
        assert_eq!(display_email(""), "Not configured");
        assert_eq!(display_email("me@example.com"), "m***@example.com");
    }
}
