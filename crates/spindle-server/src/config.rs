//! Server configuration, loaded from a JSON file at startup.
//!
//! Every field has a default, so `{}` is a valid configuration file.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use spindle_core::WorkerPoolConfig;

/// Default location of the configuration file, relative to the working
/// directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logger: LoggerConfig,
    pub workers: WorkersConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces).
    pub port: u16,

    /// Environment name. `"production"` forces JSON log output.
    pub env: String,

    /// How long shutdown waits for busy workers.
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            env: "development".to_owned(),
            shutdown_timeout_ms: 5_000,
        }
    }
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// How often the log file is rolled over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    pub log_to_stdout: bool,
    pub log_to_file: bool,

    /// Directory holding the rolling log files.
    pub log_dir: String,

    /// File name prefix; the rotation suffix is appended to it.
    pub file_prefix: String,

    pub rotation: Rotation,

    /// Number of rotated files kept on disk.
    pub max_files: usize,

    /// Emit newline-delimited JSON instead of human-readable lines.
    pub json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            log_to_stdout: true,
            log_to_file: false,
            log_dir: "logs".to_owned(),
            file_prefix: "app.log".to_owned(),
            rotation: Rotation::Daily,
            max_files: 3,
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub count: usize,
    pub queue_capacity: usize,
    pub processing_delay_ms: u64,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: 5,
            queue_capacity: 100,
            processing_delay_ms: 120_000,
        }
    }
}

impl WorkersConfig {
    pub fn pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig::default()
            .with_worker_count(self.count)
            .with_queue_capacity(self.queue_capacity)
            .with_processing_delay(Duration::from_millis(self.processing_delay_ms))
    }
}

impl Config {
    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
