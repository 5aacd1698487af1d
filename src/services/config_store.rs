// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! File-backed persistence for the monitor configuration.

use crate::models::config::{
    load_config, CheckRequest, ConfigError, EnvOverrides, MonitorConfig, PersistedConfig,
};
use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Stores the URL and keyword list as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record. A missing file is created with empty defaults.
    pub async fn load(&self) -> Result<PersistedConfig> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config file {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Creating default config file");
                let config = PersistedConfig::default();
                self.save(&config).await?;
                Ok(config)
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file {}", self.path.display())),
        }
    }

    /// Replace the persisted record. Written to a uniquely named sibling file,
    /// then renamed over, so concurrent saves never share a temp file.
    pub async fn save(&self, config: &PersistedConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_replace(&path, json.as_bytes()))
            .await
            .context("Config writer task failed")?
    }
}

fn write_replace(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("Failed to write config file {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace config file {}", path.display()))?;
    Ok(())
}

/// Resolves a `MonitorConfig` for each run from the store and the startup overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    store: ConfigStore,
    env: EnvOverrides,
}

impl ConfigLoader {
    pub fn new(store: ConfigStore, env: EnvOverrides) -> Self {
        Self { store, env }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn env(&self) -> &EnvOverrides {
        &self.env
    }

    pub async fn load(&self, request: &CheckRequest) -> Result<MonitorConfig, ConfigError> {
        let persisted = self
            .store
            .load()
            .await
            .map_err(|e| ConfigError::Store(format!("{:#}", e)))?;
        load_config(&persisted, &self.env, request)
    }
}
