//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety
//!
//! Only the binary loads configuration. Library types take their settings as
//! plain arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Ingestion configuration
    pub ingestion: IngestionConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Unique events needed before the threshold notification fires
    pub threshold: u64,
    pub buffer_size_kb: usize,
    /// Milliseconds between steps; 0 only yields to the runtime
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json: bool,
    pub json_pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

const LOG_FORMATS: [&str; 2] = ["pretty", "json"];
const LOG_OUTPUTS: [&str; 3] = ["console", "file", "both"];

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "WARN".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            ingestion: IngestionConfig {
                threshold: 1000,
                buffer_size_kb: 8,
                tick_interval_ms: 0,
            },
            output: OutputConfig {
                json: false,
                json_pretty: true,
            },
            paths: PathsConfig {
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = [
            PathBuf::from("event-analytics.toml"),
            PathBuf::from(".event-analytics.toml"),
            dirs::config_dir()
                .map(|d| d.join("event-analytics").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Ingestion overrides
        if let Ok(val) = env::var("EVENT_ANALYTICS_THRESHOLD") {
            self.ingestion.threshold = val.parse()
                .context("Invalid EVENT_ANALYTICS_THRESHOLD")?;
        }
        if let Ok(val) = env::var("EVENT_ANALYTICS_BUFFER_SIZE_KB") {
            self.ingestion.buffer_size_kb = val.parse()
                .context("Invalid EVENT_ANALYTICS_BUFFER_SIZE_KB")?;
        }
        if let Ok(val) = env::var("EVENT_ANALYTICS_TICK_MS") {
            self.ingestion.tick_interval_ms = val.parse()
                .context("Invalid EVENT_ANALYTICS_TICK_MS")?;
        }

        // Path overrides
        if let Ok(val) = env::var("EVENT_ANALYTICS_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.threshold == 0 {
            return Err(anyhow::anyhow!("Threshold must be greater than 0"));
        }

        if self.ingestion.buffer_size_kb < 1 || self.ingestion.buffer_size_kb > 1024 {
            return Err(anyhow::anyhow!(
                "Buffer size must be between 1KB and 1024KB, got {}KB",
                self.ingestion.buffer_size_kb
            ));
        }

        if self.ingestion.tick_interval_ms > 10_000 {
            warn!(
                tick_interval_ms = self.ingestion.tick_interval_ms,
                "Tick interval is very high, ingestion will be slow"
            );
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log format '{}', expected one of {:?}",
                self.logging.format,
                LOG_FORMATS
            ));
        }

        if !LOG_OUTPUTS.contains(&self.logging.output.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log output '{}', expected one of {:?}",
                self.logging.output,
                LOG_OUTPUTS
            ));
        }

        Ok(())
    }

    pub fn buffer_size_bytes(&self) -> usize {
        self.ingestion.buffer_size_kb * 1024
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
