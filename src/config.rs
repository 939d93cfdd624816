//! Configuration management for the fusion pipeline.

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub watcher: WatcherSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serving endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path of the best-effort latest-decision snapshot.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

/// Scoring model artifact configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the three model artifacts.
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
    /// Transaction tree-ensemble model file (ONNX).
    #[serde(default = "default_tx_model")]
    pub tx_model: String,
    /// Communication linear model file (JSON coefficients).
    #[serde(default = "default_comm_model")]
    pub comm_model: String,
    /// Fusion linear model file (JSON coefficients).
    #[serde(default = "default_fusion_model")]
    pub fusion_model: String,
    /// Threads for ONNX inference.
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

/// Ingestion watcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherSettings {
    /// Serving endpoint the watcher submits event pairs to.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Mailbox collaborator base URL.
    #[serde(default = "default_mailbox_url")]
    pub mailbox_url: String,
    /// Seconds between polling cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Upper bound on unread messages fetched per cycle.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Per-call timeout on outbound requests.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Alert monitor (consumer) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Latest-decision endpoint the monitor polls.
    #[serde(default = "default_latest_url")]
    pub latest_url: String,
    /// Seconds between polls.
    #[serde(default = "default_monitor_interval")]
    pub poll_interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_snapshot_path() -> String {
    "latest_output.json".to_string()
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_tx_model() -> String {
    "tx_model.onnx".to_string()
}

fn default_comm_model() -> String {
    "comm_model.json".to_string()
}

fn default_fusion_model() -> String {
    "fusion_model.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_api_url() -> String {
    std::env::var("API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000/predict".to_string())
}

fn default_mailbox_url() -> String {
    std::env::var("MAILBOX_URL").unwrap_or_else(|_| "http://127.0.0.1:8025".to_string())
}

fn default_poll_interval() -> u64 {
    15
}

fn default_max_messages() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    10
}

fn default_latest_url() -> String {
    std::env::var("LATEST_URL").unwrap_or_else(|_| "http://127.0.0.1:8000/latest".to_string())
}

fn default_monitor_interval() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from the default location, falling back to
    /// defaults when no file is present.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }

        let config = Config::builder()
            .add_source(File::from(path))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: ModelsConfig::default(),
            watcher: WatcherSettings::default(),
            monitor: MonitorSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            tx_model: default_tx_model(),
            comm_model: default_comm_model(),
            fusion_model: default_fusion_model(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            mailbox_url: default_mailbox_url(),
            poll_interval_secs: default_poll_interval(),
            max_messages: default_max_messages(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            latest_url: default_latest_url(),
            poll_interval_secs: default_monitor_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
