// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keyword_agent::app::{create_router, AppSettings, AppState, VERSION};
use keyword_agent::models::check::CheckResponse;
use keyword_agent::models::config::{parse_keywords, CheckRequest};
use keyword_agent::services::check::CheckRunner;
use keyword_agent::services::config_store::{ConfigLoader, ConfigStore, DEFAULT_CONFIG_PATH};
use keyword_agent::services::fetcher::HttpFetcher;
use keyword_agent::services::logging::{display_email, init_tracing};
use keyword_agent::services::notifier::SmtpNotifier;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "keyword-agent", version = VERSION, about = "Watch a webpage for keywords and email an alert")]
struct Cli {
    /// Path to the persisted URL/keyword config
    #[arg(long, global = true, env = "CONFIG_FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address the HTTP API listens on
    #[arg(long, global = true, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Run a single check and exit; meant for cron
    Check {
        /// Check this URL instead of the configured one
        #[arg(long)]
        url: Option<String>,
        /// Comma separated keywords overriding the configured ones
        #[arg(long)]
        keywords: Option<String>,
        /// Print the JSON response instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn build_state(config_path: PathBuf, settings: AppSettings) -> Result<AppState> {
    let fetcher = HttpFetcher::new(&settings.user_agent, settings.fetch_timeout)
        .context("Failed to build HTTP client")?;
    let notifier = SmtpNotifier::new(settings.smtp.clone());

    if settings.overrides.email_configured() {
        tracing::info!(
            sender = %display_email(&settings.overrides.sender_email),
            receiver = %display_email(&settings.overrides.receiver_email),
            "Email notifications configured"
        );
    } else {
        tracing::warn!("Email configuration incomplete - checks will fail until it is set");
    }

    Ok(AppState {
        loader: Arc::new(ConfigLoader::new(
            ConfigStore::new(config_path),
            settings.overrides,
        )),
        runner: CheckRunner::new(Arc::new(fetcher), Arc::new(notifier)),
        check_token_hash: settings.check_token_hash,
    })
}

async fn serve(state: AppState, bind: SocketAddr) -> Result<()> {
    if state.check_token_hash.is_none() {
        tracing::warn!("CHECK_TOKEN not set - /check and POST /config will refuse requests");
    }

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!("keyword-agent v{} listening on {}", VERSION, bind);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn check_once(state: AppState, request: CheckRequest, json: bool) -> Result<bool> {
    let result = state.runner.check_now(&state.loader, &request).await;

    if json {
        let response = CheckResponse::from(&result);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", result.summary());
    }
    Ok(result.success)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let settings = AppSettings::from_env()?;
    let state = build_state(cli.config, settings)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve(state, cli.bind).await?;
        }
        Command::Check {
            url,
            keywords,
            json,
        } => {
            let request = CheckRequest {
                url,
                keywords: keywords.as_deref().map(parse_keywords),
            };
            if !check_once(state, request, json).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
