// src/core/config_manager.rs
//! Layered configuration: defaults, optional `jobhunt.yaml`, environment

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::utils::resolve_path;

pub const DEFAULT_CONFIG_FILE: &str = "jobhunt.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "applications";
pub const DEFAULT_LEDGER_FILE: &str = "application_tracker.csv";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    /// Root under which `<job_id>_<title>/` folders are created.
    pub output_path: PathBuf,
    pub ledger_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

/// Shape of `jobhunt.yaml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    output_path: Option<PathBuf>,
    ledger_path: Option<PathBuf>,
    fetch_timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

impl ConfigManager {
    /// Load all configurations
    pub fn load() -> Result<Self> {
        let file_path = std::env::var("JOBHUNT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let file = if file_path.exists() {
            Self::read_file(&file_path)?
        } else {
            ConfigFile::default()
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Environment variables take precedence over the file.
    fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let output_path = env("JOBHUNT_OUTPUT_DIR")
            .map(PathBuf::from)
            .or(file.output_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let ledger_path = env("JOBHUNT_LEDGER_PATH")
            .map(PathBuf::from)
            .or(file.ledger_path)
            .unwrap_or_else(|| output_path.join(DEFAULT_LEDGER_FILE));

        let timeout_seconds = match env("JOBHUNT_FETCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("JOBHUNT_FETCH_TIMEOUT_SECS must be a whole number of seconds")?,
            None => file
                .fetch_timeout_seconds
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        Ok(Self {
            environment: EnvironmentConfig {
                output_path: resolve_path(&output_path),
                ledger_path: resolve_path(&ledger_path),
            },
            fetch: FetchConfig {
                timeout_seconds,
                user_agent: file
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            },
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, output_dir: Option<PathBuf>, ledger: Option<PathBuf>) -> Self {
        if let Some(dir) = output_dir {
            self.environment.output_path = resolve_path(&dir);
        }
        if let Some(ledger) = ledger {
            self.environment.ledger_path = resolve_path(&ledger);
        }
        self
    }
}
