use crate::errors::ConfigError;
use crate::infrastructure::logging::{parse_level, LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// File name searched for by `Config::discover`
pub const CONFIG_FILE_NAME: &str = "ticker.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ticker: TickerConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Length of one time unit
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// Report ticks that overran the time unit through the status sink
    #[serde(default = "default_true")]
    pub report_overruns: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Run the marshalling probe methods after every update callback
    #[serde(default)]
    pub probe_marshalling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Extra filter directives, e.g. "ticker=trace"
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            thread_name: default_thread_name(),
            report_overruns: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            filter: None,
        }
    }
}

fn default_true() -> bool { true }
fn default_interval_ms() -> u64 { 1000 }
fn default_thread_name() -> String { "ticker".to_string() }
fn default_level() -> String { "info".to_string() }

impl TickerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis().max(1) as u64;
        self
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self) -> LogConfig {
        let mut config = LogConfig::new()
            .with_level(parse_level(&self.level))
            .with_format(self.format);
        if let Some(filter) = &self.filter {
            config = config.with_filter(filter.clone());
        }
        config
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.interval_ms == 0 {
            return Err(ConfigError::Parse("ticker.interval_ms must be at least 1".to_string()));
        }
        if self.ticker.thread_name.is_empty() {
            return Err(ConfigError::Parse("ticker.thread_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Find `ticker.toml` in the current directory or its parents.
    /// Falls back to defaults when none is found or it fails to load.
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Self::default(),
        }
    }

    pub fn discover_from(start: &Path) -> Self {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring config file");
                    }
                }
            }

            current = dir.parent().map(|p| p.to_path_buf());
        }

        Self::default()
    }
}
