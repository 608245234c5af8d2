//! Configuration frontend
//!
//! TOML configuration for the ticker, the bridge and logging.

pub mod config;

pub use config::{BridgeConfig, Config, LoggingConfig, TickerConfig, CONFIG_FILE_NAME};
